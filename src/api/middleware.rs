//! Route protection for pages and APIs that require a session.
//!
//! Requests whose path falls under one of the protected prefixes must carry
//! a valid session cookie. Anything else is redirected to the sign-in page.
//! On success the validated [`Claims`] are attached to the request
//! extensions for downstream handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use log::debug;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use crate::account::AuthService;
use crate::config::SessionConfig;
use crate::security::Claims;

/// True when `path` is a protected prefix itself or lies beneath one
///
/// `/dashboard` and `/dashboard/stats` match the prefix `/dashboard`;
/// `/dashboarding` does not.
pub fn is_protected(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    })
}

/// Route guard middleware factory
#[derive(Clone)]
pub struct RouteGuard {
    auth: Arc<AuthService>,
    cookie_name: Rc<str>,
    prefixes: Rc<[String]>,
    sign_in_path: Rc<str>,
}

impl RouteGuard {
    pub fn new(auth: Arc<AuthService>, session: &SessionConfig) -> Self {
        Self {
            auth,
            cookie_name: Rc::from(session.cookie_name.as_str()),
            prefixes: Rc::from(session.protected_prefixes.clone()),
            sign_in_path: Rc::from(session.sign_in_path.as_str()),
        }
    }
}

impl<S> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RouteGuardService {
            service: Rc::new(service),
            guard: self.clone(),
        }))
    }
}

pub struct RouteGuardService<S> {
    service: Rc<S>,
    guard: RouteGuard,
}

impl<S> Service<ServiceRequest> for RouteGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        // Match on the percent-decoded path the router sees, not the raw URI
        if !is_protected(req.match_info().as_str(), &self.guard.prefixes) {
            return Box::pin(async move { service.call(req).await });
        }

        let token = req.cookie(&self.guard.cookie_name).map(|c| c.value().to_string());
        let claims: Option<Claims> = self.guard.auth.session(token.as_deref());

        match claims {
            Some(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(async move { service.call(req).await })
            }
            None => {
                debug!("Redirecting unauthenticated request for {}", req.match_info().as_str());
                let location = self.guard.sign_in_path.to_string();
                Box::pin(async move {
                    let (req, _) = req.into_parts();
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, location))
                        .finish();
                    Ok(ServiceResponse::new(req, response))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::repository::MockAccountRepository;
    use crate::config::Config;
    use crate::database::models::{Account, Role};
    use crate::security::password::MockCredentialHasher;
    use crate::security::TokenIssuer;
    use actix_web::test::{call_and_read_body, call_service, init_service, TestRequest};
    use actix_web::{cookie::Cookie, http::StatusCode, web::{self, Bytes}, App};
    use chrono::{Duration, Utc};
    use test_case::test_case;

    fn prefixes() -> Vec<String> {
        Config::default().session.protected_prefixes
    }

    #[test_case("/dashboard" => true ; "exact prefix")]
    #[test_case("/dashboard/" => true ; "prefix with slash")]
    #[test_case("/dashboard/stats" => true ; "nested page")]
    #[test_case("/locations/42/edit" => true ; "deeply nested")]
    #[test_case("/api/secure/session" => true ; "secure api")]
    #[test_case("/dashboarding" => false ; "shared leading characters")]
    #[test_case("/" => false ; "home")]
    #[test_case("/signin" => false ; "sign in page")]
    #[test_case("/api/auth/login" => false ; "auth api")]
    fn test_is_protected(path: &str) -> bool {
        is_protected(path, &prefixes())
    }

    #[test]
    fn test_trailing_slash_in_prefix_is_ignored() {
        let prefixes = vec!["/admin/".to_string()];
        assert!(is_protected("/admin", &prefixes));
        assert!(is_protected("/admin/users", &prefixes));
        assert!(!is_protected("/administrator", &prefixes));
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("middleware-test-secret", Duration::hours(2), "sabjaano")
    }

    fn guard() -> RouteGuard {
        let auth = AuthService::new(
            Arc::new(MockAccountRepository::new()),
            Arc::new(MockCredentialHasher::new()),
            issuer(),
        );
        RouteGuard::new(Arc::new(auth), &Config::default().session)
    }

    fn account() -> Account {
        Account::new("a@b.com".to_string(), "hash".to_string(), Role::Owner)
    }

    async fn echo_claims(req: actix_web::HttpRequest) -> HttpResponse {
        match req.extensions().get::<Claims>() {
            Some(claims) => HttpResponse::Ok().body(claims.email.clone()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    macro_rules! guarded_app {
        () => {
            init_service(
                App::new()
                    .wrap(guard())
                    .route("/dashboard", web::get().to(echo_claims))
                    .route("/dashboard/{page}", web::get().to(echo_claims))
                    .route("/about", web::get().to(echo_claims)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_redirects_without_cookie() {
        let app = guarded_app!();

        let req = TestRequest::get().uri("/dashboard/stats").to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/signin");
    }

    #[actix_web::test]
    async fn test_percent_encoded_paths_are_guarded() {
        let app = guarded_app!();

        for uri in ["/%64ashboard", "/%64ashboard/stats", "/dash%62oard/stats"] {
            let req = TestRequest::get().uri(uri).to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "uri {}", uri);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/signin");
        }
    }

    #[actix_web::test]
    async fn test_redirects_with_bad_tokens() {
        let app = guarded_app!();

        let expired = issuer()
            .issue_at(&account(), Utc::now() - Duration::hours(3))
            .unwrap()
            .0;
        let foreign = TokenIssuer::new("another-secret", Duration::hours(2), "sabjaano")
            .issue(&account())
            .unwrap()
            .0;

        for token in ["", "not-a-jwt", expired.as_str(), foreign.as_str()] {
            let req = TestRequest::get()
                .uri("/dashboard")
                .cookie(Cookie::new("token", token.to_string()))
                .to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "token {:?}", token);
        }
    }

    #[actix_web::test]
    async fn test_valid_cookie_passes_and_attaches_claims() {
        let app = guarded_app!();
        let (token, _) = issuer().issue(&account()).unwrap();

        let req = TestRequest::get()
            .uri("/dashboard")
            .cookie(Cookie::new("token", token))
            .to_request();
        let body = call_and_read_body(&app, req).await;

        assert_eq!(body, Bytes::from_static(b"a@b.com"));
    }

    #[actix_web::test]
    async fn test_public_paths_untouched() {
        let app = guarded_app!();

        let req = TestRequest::get().uri("/about").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
