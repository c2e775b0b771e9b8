use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, jobs, models, routes, users};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::sign_up,
		routes::auth::sign_in,
		routes::auth::sign_out,
		routes::auth::change_password,
		routes::auth::current_session,
		routes::auth::list_sessions,
		routes::auth::revoke_session,
		routes::auth::revoke_other_sessions,
		routes::users::list_users,
		routes::users::create_user,
		routes::users::get_user,
		routes::users::update_user,
		routes::users::remove_user,
		routes::users::ban_user,
		routes::users::unban_user,
		routes::users::set_role,
		routes::users::set_password,
		routes::users::list_user_sessions,
		routes::users::revoke_user_sessions,
		routes::users::revoke_user_session,
		routes::users::impersonate_user,
		routes::users::bulk_action,
		routes::users::export,
		routes::rbac::list_roles,
		routes::rbac::get_role,
		routes::rbac::replace_role,
		routes::rbac::assignable_roles,
		routes::rbac::check_permission,
		routes::organizations::list_organizations,
		routes::organizations::create_organization,
		routes::organizations::get_organization,
		routes::organizations::update_organization,
		routes::organizations::delete_organization,
		routes::organizations::list_members,
		routes::organizations::add_member,
		routes::organizations::update_member_role,
		routes::organizations::remove_member,
		routes::organizations::list_invitations,
		routes::organizations::create_invitation,
		routes::organizations::cancel_invitation,
		routes::organizations::list_teams,
		routes::organizations::create_team,
		routes::organizations::remove_team,
		routes::api_keys::list_api_keys,
		routes::api_keys::create_api_key,
		routes::api_keys::update_api_key,
		routes::api_keys::delete_api_key,
		routes::api_keys::verify_api_key,
		routes::jobs::list_jobs,
		routes::jobs::validate_job,
		routes::jobs::create_job,
		routes::jobs::list_history,
		routes::jobs::get_job,
		routes::jobs::delete_job,
		routes::jobs::pause_job,
		routes::jobs::resume_job,
		routes::proxy::forward
	),
	components(
		schemas(
			routes::health::HealthResponse,
			models::user::User,
			models::user::CreateUserRequest,
			models::user::UpdateUserRequest,
			models::user::BanUserRequest,
			models::user::SetRoleRequest,
			models::user::SetPasswordRequest,
			models::user::SignUpRequest,
			models::user::SignInRequest,
			models::user::ChangePasswordRequest,
			models::user::AuthResponse,
			models::user::MessageResponse,
			models::session::Session,
			models::session::SessionWithUser,
			models::session::RevokeSessionRequest,
			models::organization::Organization,
			models::organization::Member,
			models::organization::Invitation,
			models::organization::Team,
			models::organization::FullOrganization,
			models::organization::CreateOrganizationRequest,
			models::organization::UpdateOrganizationRequest,
			models::organization::AddMemberRequest,
			models::organization::UpdateMemberRoleRequest,
			models::organization::InviteMemberRequest,
			models::organization::CreateTeamRequest,
			models::api_key::ApiKey,
			models::api_key::CreatedApiKey,
			models::api_key::CreateApiKeyRequest,
			models::api_key::UpdateApiKeyRequest,
			models::api_key::VerifyApiKeyRequest,
			models::api_key::ApiKeyVerification,
			models::rbac::Role,
			models::rbac::RoleUpdateRequest,
			models::rbac::PermissionCheckResponse,
			models::rbac::AssignableRolesResponse,
			authz::Permission,
			models::job::Job,
			models::job::JobCreateRequest,
			models::job::JobHistory,
			models::job::TriggerType,
			models::page::UserPage,
			models::page::JobPage,
			models::page::JobHistoryPage,
			jobs::JobForm,
			jobs::FieldErrors,
			routes::jobs::JobValidationResponse,
			users::BulkRequest,
			users::BulkAction,
			users::BulkOutcome,
			users::BulkFailure,
			users::UserStatus,
			users::ExportFormat
		)
	),
	tags(
		(name = "Health", description = "Liveness and database check"),
		(name = "Auth", description = "Sign-in and session endpoints of the auth service"),
		(name = "Users", description = "User administration"),
		(name = "RBAC", description = "Role table and permission checks"),
		(name = "Organizations", description = "Organizations, members, invitations and teams"),
		(name = "API Keys", description = "API key management"),
		(name = "Jobs", description = "Scheduler jobs"),
		(name = "Proxy", description = "Pass-through to the backend API")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
	map.entry(key.to_string())
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else {
		return;
	};
	let Some(schemes) = object_entry(root, "components").and_then(|c| object_entry(c, "securitySchemes")) else {
		return;
	};

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"description": "Session token of the auth service"
		}),
	);
	schemes.insert(
		"apiKey".to_string(),
		json!({
			"type": "apiKey",
			"in": "header",
			"name": "x-api-key"
		}),
	);
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{port}");

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
