//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification. The handlers
//! themselves live in the sibling modules, grouped by resource.

use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::federated_handler,
        crate::web::auth::federated_callback_handler,
        crate::web::profile::get_profile_handler,
        crate::web::profile::update_profile_handler,
        crate::web::profile::access_handler,
        crate::web::notifications::list_notifications_handler,
        crate::web::notifications::mark_read_handler,
        crate::web::notifications::mark_all_read_handler,
        crate::web::tickets::list_tickets_handler,
        crate::web::tickets::create_ticket_handler,
        crate::web::tickets::update_ticket_status_handler,
        crate::web::announcements::list_announcements_handler,
        crate::web::announcements::create_announcement_handler,
        crate::web::chat::chat_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            crate::web::profile::ProfileView,
            crate::web::profile::UpdateProfileRequest,
            crate::web::profile::NavEntryView,
            crate::web::profile::AccessResponse,
            crate::web::notifications::NotificationView,
            crate::web::notifications::NotificationListResponse,
            crate::web::tickets::CreateTicketRequest,
            crate::web::tickets::UpdateTicketStatusRequest,
            crate::web::tickets::TicketView,
            crate::web::announcements::CreateAnnouncementRequest,
            crate::web::announcements::AnnouncementView,
            crate::web::chat::ChatTurnBody,
            crate::web::chat::ChatRequest,
            crate::web::chat::ChatResponse,
        )
    ),
    tags(
        (name = "Campus Portal API", description = "API endpoints for the university portal: sessions, profiles, notifications, tickets, announcements, and the campus assistant.")
    )
)]
pub struct ApiDoc;
