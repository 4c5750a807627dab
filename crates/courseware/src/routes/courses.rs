//! `/courses` handlers.
//!
//! Mutations load the course before checking ownership, so a missing course
//! is a 404 for everyone and only an existing course can produce a 403.

use std::collections::hash_map::{Entry, HashMap};

use courseware_auth::authorize_owner;
use courseware_core::{
    Course, CourseChanges, CourseId, CourseView, CoursewareError, NewCourse, RequestContext, User,
    UserId,
};
use courseware_server::{HandlerResult, Reply};
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::store_error;
use crate::app::AppState;

/// Returned for an unknown or malformed course id.
pub const COURSE_NOT_FOUND_MESSAGE: &str = "Course Not Found";

/// Body of `POST /courses`. A `userId` in the body is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form time estimate.
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Free-form list of materials.
    #[serde(default)]
    pub materials_needed: Option<String>,
}

/// Body of `PUT /courses/{id}`.
///
/// For the optional fields an explicit `null` clears the stored value and an
/// absent key leaves it alone.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New time estimate.
    #[serde(default, deserialize_with = "explicit")]
    pub estimated_time: Option<Option<String>>,
    /// New materials list.
    #[serde(default, deserialize_with = "explicit")]
    pub materials_needed: Option<Option<String>>,
}

fn explicit<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdateCourseRequest> for CourseChanges {
    fn from(body: UpdateCourseRequest) -> Self {
        Self {
            title: body.title,
            description: body.description,
            estimated_time: body.estimated_time,
            materials_needed: body.materials_needed,
        }
    }
}

fn not_found() -> CoursewareError {
    CoursewareError::not_found(COURSE_NOT_FOUND_MESSAGE)
}

/// Parses the `{id}` segment. Anything that is not a course id cannot name
/// a stored course.
fn course_id(ctx: &RequestContext) -> Result<CourseId, CoursewareError> {
    ctx.path_param("id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(not_found)
}

async fn load_course(state: &AppState, id: CourseId) -> Result<Course, CoursewareError> {
    state
        .courses
        .find_course(id)
        .await
        .map_err(store_error)?
        .ok_or_else(not_found)
}

async fn load_owner(state: &AppState, id: UserId) -> Result<User, CoursewareError> {
    state
        .users
        .find_by_id(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| CoursewareError::internal(format!("Owner {id} of a stored course is missing")))
}

/// `GET /courses`: every course with its owner.
pub async fn list_courses(state: AppState, _ctx: RequestContext) -> HandlerResult {
    let courses = state.courses.list_courses().await.map_err(store_error)?;

    let mut owners: HashMap<UserId, User> = HashMap::new();
    let mut views = Vec::with_capacity(courses.len());
    for course in courses {
        let owner = match owners.entry(course.owner_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(load_owner(&state, course.owner_id).await?),
        };
        views.push(CourseView::new(course, owner));
    }

    Reply::ok(&views)
}

/// `GET /courses/{id}`.
pub async fn get_course(state: AppState, ctx: RequestContext) -> HandlerResult {
    let course = load_course(&state, course_id(&ctx)?).await?;
    let owner = load_owner(&state, course.owner_id).await?;
    Reply::ok(&CourseView::new(course, &owner))
}

/// `POST /courses`: the caller becomes the owner.
pub async fn create_course(
    state: AppState,
    ctx: RequestContext,
    body: CreateCourseRequest,
) -> HandlerResult {
    let user = ctx.authenticated()?;
    let course = state
        .courses
        .insert_course(NewCourse {
            title: body.title,
            description: body.description,
            estimated_time: body.estimated_time,
            materials_needed: body.materials_needed,
            owner_id: user.id,
        })
        .await
        .map_err(store_error)?;

    info!(
        request_id = %ctx.request_id(),
        course_id = %course.id,
        caller = %ctx.identity().log_id(),
        "created course"
    );
    Ok(Reply::created(format!("/courses/{}", course.id)))
}

/// `PUT /courses/{id}`: owner only.
pub async fn update_course(
    state: AppState,
    ctx: RequestContext,
    body: UpdateCourseRequest,
) -> HandlerResult {
    let user = ctx.authenticated()?;
    let id = course_id(&ctx)?;
    let course = load_course(&state, id).await?;
    authorize_owner(user, &course)?;

    // deleted between the ownership check and the write
    state
        .courses
        .update_course(id, body.into())
        .await
        .map_err(store_error)?
        .ok_or_else(not_found)?;

    info!(request_id = %ctx.request_id(), course_id = %id, "updated course");
    Ok(Reply::no_content())
}

/// `DELETE /courses/{id}`: owner only.
pub async fn delete_course(state: AppState, ctx: RequestContext) -> HandlerResult {
    let user = ctx.authenticated()?;
    let id = course_id(&ctx)?;
    let course = load_course(&state, id).await?;
    authorize_owner(user, &course)?;

    if !state.courses.delete_course(id).await.map_err(store_error)? {
        return Err(not_found());
    }

    info!(request_id = %ctx.request_id(), course_id = %id, "deleted course");
    Ok(Reply::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_body_distinguishes_null_from_absent() {
        let body: UpdateCourseRequest =
            serde_json::from_str(r#"{"title":"New","estimatedTime":null}"#).unwrap();
        let changes = CourseChanges::from(body);
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert_eq!(changes.description, None);
        assert_eq!(changes.estimated_time, Some(None));
        assert_eq!(changes.materials_needed, None);
    }

    #[test]
    fn test_create_body_ignores_user_id() {
        let body: CreateCourseRequest =
            serde_json::from_str(r#"{"title":"T","description":"D","userId":99}"#).unwrap();
        assert_eq!(body.title, "T");
        assert!(body.estimated_time.is_none());
    }

    #[test]
    fn test_course_id_parsing() {
        let ctx = RequestContext::new().with_path_param("id", "12");
        assert_eq!(course_id(&ctx).unwrap(), CourseId::new(12));

        let ctx = RequestContext::new().with_path_param("id", "abc");
        assert!(matches!(course_id(&ctx), Err(CoursewareError::NotFound { .. })));
    }
}
