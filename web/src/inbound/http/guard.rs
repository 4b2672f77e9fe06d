//! Route guard middleware.
//!
//! Evaluates each page request against a [`RouteTable`] and answers
//! `302 Found` when the caller must be sent elsewhere. Paths rejected by the
//! [`PathFilter`] (form actions, probes, sockets, assets) pass straight
//! through. The guard reads the session cookie, so it must be wrapped inside
//! the session middleware.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::HttpResponse;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::LOCATION;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use super::session::SessionContext;
use crate::domain::ports::SessionStore;
use crate::domain::{GuardDecision, PathFilter, RouteTable};

/// Middleware factory redirecting requests the [`RouteTable`] refuses.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use threads_web::inbound::http::guard::RouteGuard;
///
/// let app = App::new().wrap(RouteGuard::default());
/// ```
#[derive(Clone, Default)]
pub struct RouteGuard {
    rules: Arc<GuardRules>,
}

#[derive(Default)]
struct GuardRules {
    table: RouteTable,
    filter: PathFilter,
}

impl RouteGuard {
    pub fn new(table: RouteTable, filter: PathFilter) -> Self {
        Self {
            rules: Arc::new(GuardRules { table, filter }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RouteGuardMiddleware {
            service,
            rules: Arc::clone(&self.rules),
        }))
    }
}

/// Service wrapper produced by [`RouteGuard`].
pub struct RouteGuardMiddleware<S> {
    service: S,
    rules: Arc<GuardRules>,
}

impl<S, B> Service<ServiceRequest> for RouteGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_owned();
        if !self.rules.filter.applies_to(&path) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let authenticated = SessionContext::from_service_request(&req)
            .current_session()
            .is_some();
        match self.rules.table.decide(&path, authenticated) {
            GuardDecision::Allow => {
                debug!(%path, authenticated, "route guard allowed request");
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            GuardDecision::Redirect(target) => {
                debug!(%path, authenticated, %target, "route guard redirected request");
                let response = HttpResponse::Found()
                    .insert_header((LOCATION, target))
                    .finish();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
