use crate::permission::Permission;
use crate::user::Profile;
use actix_session::{Session, SessionExt};
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{error, web::Data, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone)]
pub struct ClientCtxInner {
    /// User data. Optional. None is a guest user.
    pub client: Option<Profile>,
    /// CSRF token for form protection
    pub csrf_token: String,
    /// Path and query of the request, used as `next` when a login is required.
    pub request_path: String,
    /// Session handle used to drain flash messages at render time.
    pub session: Option<Session>,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            client: None,
            csrf_token: String::new(),
            request_path: "/".to_owned(),
            session: None,
            request_start: Instant::now(),
        }
    }
}

impl std::fmt::Debug for ClientCtxInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCtxInner")
            .field("client", &self.client)
            .field("request_path", &self.request_path)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl ClientCtxInner {
    /// Authenticates the session and refreshes `last_seen` for logged in users.
    pub async fn from_session(
        session: &Session,
        db: &DatabaseConnection,
        request_path: String,
    ) -> Self {
        use crate::middleware::csrf::get_or_create_csrf_token;
        use crate::session::{end_session, get_session_user_id};

        let client = match get_session_user_id(session) {
            Some(user_id) => match Profile::get_by_id(db, user_id).await {
                Ok(Some(profile)) => Some(profile),
                Ok(None) => {
                    log::debug!("session references missing user_id={}", user_id);
                    end_session(session);
                    None
                }
                Err(e) => {
                    log::error!("ClientCtx: failed to load user_id={}: {}", user_id, e);
                    None
                }
            },
            None => None,
        };

        if let Some(ref user) = client {
            if let Err(e) = crate::user::touch_last_seen(db, user.id).await {
                log::error!("ClientCtx: failed to update last_seen: {}", e);
            }
        }

        // Get or create CSRF token for this session
        let csrf_token = get_or_create_csrf_token(session).unwrap_or_else(|_| String::new());

        ClientCtxInner {
            client,
            csrf_token,
            request_path,
            session: Some(session.clone()),
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's nickname or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.client {
            Some(user) => user.nickname.to_owned(),
            None => crate::constants::GUEST_USERNAME.to_owned(),
        }
    }

    /// Configured site name for page titles and the header.
    pub fn site_name(&self) -> String {
        crate::app_config::site().name
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    /// Bitwise check against the user's role. Guests can do nothing.
    pub fn can(&self, permission: Permission) -> bool {
        self.0
            .client
            .as_ref()
            .map(|u| u.can(permission))
            .unwrap_or(false)
    }

    pub fn can_follow(&self) -> bool {
        self.can(Permission::FOLLOW)
    }

    pub fn can_comment(&self) -> bool {
        self.can(Permission::COMMENT)
    }

    pub fn can_write(&self) -> bool {
        self.can(Permission::WRITE_ARTICLES)
    }

    pub fn can_moderate(&self) -> bool {
        self.can(Permission::MODERATE_COMMENTS)
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMINISTER)
    }

    /// Authors may edit their own posts; administrators may edit any.
    pub fn can_edit_post(&self, author_id: i32) -> bool {
        self.get_id() == Some(author_id) || self.is_administrator()
    }

    /// Drains the flash messages queued for this session.
    pub fn take_flashes(&self) -> Vec<String> {
        match &self.0.session {
            Some(session) => crate::flash::take_flashes(session),
            None => Vec::new(),
        }
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }

    /// Require user to be logged in. Returns user_id, or an error that
    /// redirects to the login form and back here afterwards.
    pub fn require_login(&self) -> Result<i32, Error> {
        self.get_id().ok_or_else(|| {
            let location = format!(
                "/login?next={}",
                urlencoding::encode(&self.0.request_path)
            );
            error::InternalError::from_response(
                "Login required",
                HttpResponse::Found()
                    .append_header((actix_web::http::header::LOCATION, location))
                    .finish(),
            )
            .into()
        })
    }

    /// Require specific permission. Returns () or ErrorForbidden.
    pub fn require_permission(&self, permission: Permission) -> Result<(), Error> {
        if !self.can(permission) {
            return Err(error::ErrorForbidden("Insufficient permissions"));
        }
        Ok(())
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Without a database there is no user to authenticate; routes get a guest context.
        Box::pin(async move {
            if let Some(db) = req.app_data::<Data<DatabaseConnection>>() {
                let db = db.clone();
                let session = req.get_session();
                let request_path = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_owned())
                    .unwrap_or_else(|| req.path().to_owned());

                let inner = ClientCtxInner::from_session(&session, &db, request_path).await;
                req.extensions_mut().insert(Data::new(inner));
            }

            svc.call(req).await
        })
    }
}
