//! Access control list middleware for the booking server.
//! This middleware can be placed on any route or service.
//!
//! It authenticates the request from its session token and then checks the role in the token against the roles the
//! route requires. Requests without a valid token get a 401 Unauthorized response, and requests from users without the
//! required role get a 403 Forbidden response. Otherwise the claims are stored in the request extensions and the
//! request continues.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use booking_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::claims_from_request,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = claims_from_request(req.request()).map_err(|e| {
                debug!("🔐️ Unauthenticated request for {}. {e}", req.path());
                e
            })?;
            if !required_roles.iter().all(|role| claims.has_role(*role)) {
                info!("🔐️ {} ({}) may not access {}", claims.email, claims.role, req.path());
                let roles = required_roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
                return Err(ServerError::from(AuthError::InsufficientPermissions(format!("Requires {roles}"))).into());
            }
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
