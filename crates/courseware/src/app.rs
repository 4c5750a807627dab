//! Wiring: routes, pipeline and handlers for one configuration.

use std::sync::Arc;

use courseware_auth::{Authenticator, HashParams, IdentityResolver, SecretError, SecretHasher};
use courseware_config::CoursewareConfig;
use courseware_middleware::stages::{
    AuthenticationMiddleware, ErrorHandlerMiddleware, RequestIdMiddleware, Rule, RuleSet,
    TelemetryMiddleware, ValidationMiddleware,
};
use courseware_middleware::Pipeline;
use courseware_server::{HandlerRegistry, Router, Server, ServerConfig};
use courseware_store::{CourseStore, UserStore};
use http::Method;

use crate::routes::{courses, users};

/// `GET /users`
pub const GET_USER: &str = "getUser";
/// `POST /users`
pub const CREATE_USER: &str = "createUser";
/// `GET /courses`
pub const LIST_COURSES: &str = "listCourses";
/// `GET /courses/{id}`
pub const GET_COURSE: &str = "getCourse";
/// `POST /courses`
pub const CREATE_COURSE: &str = "createCourse";
/// `PUT /courses/{id}`
pub const UPDATE_COURSE: &str = "updateCourse";
/// `DELETE /courses/{id}`
pub const DELETE_COURSE: &str = "deleteCourse";

/// Operations that require credentials.
pub const PROTECTED_OPERATIONS: [&str; 4] = [GET_USER, CREATE_COURSE, UPDATE_COURSE, DELETE_COURSE];

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// User records.
    pub users: Arc<dyn UserStore>,
    /// Course records.
    pub courses: Arc<dyn CourseStore>,
    /// Hasher for new passwords.
    pub hasher: SecretHasher,
}

impl AppState {
    /// Uses one store for both record kinds.
    pub fn new<S>(store: Arc<S>, hasher: SecretHasher) -> Self
    where
        S: UserStore + CourseStore,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let courses: Arc<dyn CourseStore> = store;
        Self {
            users,
            courses,
            hasher,
        }
    }
}

/// Builds the password hasher from the security section.
pub fn hasher_from_config(config: &CoursewareConfig) -> Result<SecretHasher, SecretError> {
    SecretHasher::new(HashParams {
        memory_kib: config.security.hash_memory_kib,
        iterations: config.security.hash_iterations,
        parallelism: config.security.hash_parallelism,
    })
}

/// The route table.
pub fn router() -> Router {
    Router::new()
        .with_route(Method::GET, "/users", GET_USER)
        .with_route(Method::POST, "/users", CREATE_USER)
        .with_route(Method::GET, "/courses", LIST_COURSES)
        .with_route(Method::GET, "/courses/{id}", GET_COURSE)
        .with_route(Method::POST, "/courses", CREATE_COURSE)
        .with_route(Method::PUT, "/courses/{id}", UPDATE_COURSE)
        .with_route(Method::DELETE, "/courses/{id}", DELETE_COURSE)
}

/// Field rules per operation.
pub fn validation() -> ValidationMiddleware {
    ValidationMiddleware::new()
        .rules(
            CREATE_USER,
            RuleSet::new()
                .rule(Rule::present("firstName"))
                .rule(Rule::present("lastName"))
                .rule(Rule::present("emailAddress"))
                .rule(Rule::email("emailAddress"))
                .rule(Rule::present("password")),
        )
        .rules(
            CREATE_COURSE,
            RuleSet::new()
                .rule(Rule::present("title"))
                .rule(Rule::present("description")),
        )
        .rules(
            UPDATE_COURSE,
            RuleSet::new()
                .rule(Rule::truthy("title"))
                .rule(Rule::truthy("description")),
        )
}

/// The request pipeline, authentication before validation.
pub fn pipeline(config: &CoursewareConfig, state: &AppState) -> Pipeline {
    let request_id = if config.security.trust_request_id {
        RequestIdMiddleware::trust_incoming()
    } else {
        RequestIdMiddleware::new()
    };

    let authenticator = Authenticator::new(
        IdentityResolver::new(Arc::clone(&state.users)),
        state.hasher.clone(),
    );
    let authentication = PROTECTED_OPERATIONS
        .into_iter()
        .fold(AuthenticationMiddleware::new(authenticator), |stage, operation| {
            stage.protect(operation)
        });

    Pipeline::builder()
        .stage(request_id)
        .stage(TelemetryMiddleware::new(&config.telemetry.service_name))
        .stage(ErrorHandlerMiddleware::new(config.errors.log_errors))
        .stage(authentication)
        .stage(validation())
        .build()
}

/// Registers every handler.
pub fn handlers(state: &AppState) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register_no_body(GET_USER, users::get_user);

    let s = state.clone();
    registry.register(CREATE_USER, move |ctx, body| users::create_user(s.clone(), ctx, body));

    let s = state.clone();
    registry.register_no_body(LIST_COURSES, move |ctx| courses::list_courses(s.clone(), ctx));

    let s = state.clone();
    registry.register_no_body(GET_COURSE, move |ctx| courses::get_course(s.clone(), ctx));

    let s = state.clone();
    registry.register(CREATE_COURSE, move |ctx, body| courses::create_course(s.clone(), ctx, body));

    let s = state.clone();
    registry.register(UPDATE_COURSE, move |ctx, body| courses::update_course(s.clone(), ctx, body));

    let s = state.clone();
    registry.register_no_body(DELETE_COURSE, move |ctx| courses::delete_course(s.clone(), ctx));

    registry
}

fn server_config(config: &CoursewareConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.server.shutdown_timeout())
        .request_timeout(config.server.request_timeout())
        .max_body_bytes(config.server.max_body_bytes)
        .build()
}

/// Builds a ready-to-run server over `store`.
pub fn build_server<S>(config: &CoursewareConfig, store: Arc<S>) -> Result<Server, SecretError>
where
    S: UserStore + CourseStore,
{
    let state = AppState::new(store, hasher_from_config(config)?);
    Ok(build_server_with_state(config, &state))
}

/// Builds a server over an existing [`AppState`].
pub fn build_server_with_state(config: &CoursewareConfig, state: &AppState) -> Server {
    Server::builder()
        .config(server_config(config))
        .router(router())
        .handlers(handlers(state))
        .pipeline(pipeline(config, state))
        .build()
}
