//! gRPC implementation for UserService.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use common::AppError;
use domain::User;
use proto::auth::{
    user_service_server::UserService as UserServiceProto, CreateUserRequest, CreateUserResponse,
    DeleteUserRequest, DeleteUserResponse, GetListUserRequest, GetListUserResponse,
    GetUserRequest, GetUserResponse, LoginRequest, LoginResponse, UpdateUserRequest,
    UpdateUserResponse, User as UserProto,
};

use crate::service::{CallContext, UserChanges, UserService};

/// gRPC service wrapper for UserService.
pub struct UserGrpcService {
    service: Arc<dyn UserService>,
}

impl UserGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn UserService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl UserServiceProto for UserGrpcService {
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<CreateUserResponse>, Status> {
        let ctx = CallContext::from_request(&request);
        let req = request.into_inner();

        let id = self
            .service
            .create_user(&ctx, req.name, req.email, req.password)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(CreateUserResponse { id: id.to_string() }))
    }

    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<GetUserResponse>, Status> {
        let ctx = CallContext::from_request(&request);
        let id = parse_uuid(&request.get_ref().id)?;

        let user = self.service.get_user(&ctx, id).await.map_err(Status::from)?;
        Ok(Response::new(GetUserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    async fn get_list_users(
        &self,
        request: Request<GetListUserRequest>,
    ) -> Result<Response<GetListUserResponse>, Status> {
        let ctx = CallContext::from_request(&request);

        let users = self.service.list_users(&ctx).await.map_err(Status::from)?;
        Ok(Response::new(GetListUserResponse {
            users: users.iter().map(user_to_proto).collect(),
        }))
    }

    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<UpdateUserResponse>, Status> {
        let ctx = CallContext::from_request(&request);
        let req = request.into_inner();
        let id = parse_uuid(&req.id)?;

        let changes = UserChanges {
            name: req.name,
            email: req.email,
            password: req.password,
        };
        self.service
            .update_user(&ctx, id, changes)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(UpdateUserResponse {}))
    }

    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserResponse>, Status> {
        let ctx = CallContext::from_request(&request);
        let id = parse_uuid(&request.get_ref().id)?;

        self.service
            .delete_user(&ctx, id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(DeleteUserResponse { success: true }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let ctx = CallContext::from_request(&request);
        let req = request.into_inner();

        let token = self
            .service
            .login(&ctx, req.email, req.password)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(LoginResponse { token }))
    }
}

/// Parse UUID from string.
fn parse_uuid(s: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(s).map_err(|_| Status::from(AppError::validation("Invalid UUID format")))
}

/// Convert domain User to proto User (password always empty).
fn user_to_proto(user: &User) -> UserProto {
    UserProto {
        id: user.id().to_string(),
        name: user.name().to_string(),
        email: user.email().to_string(),
        password: String::new(),
        is_active: user.is_active(),
        created_at: Some(to_timestamp(user.created_at())),
        updated_at: Some(to_timestamp(user.updated_at())),
    }
}

fn to_timestamp(at: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}
