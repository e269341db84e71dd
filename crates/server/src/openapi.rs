use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Client as returned in envelope `data`. The password digest is never exposed.
#[derive(ToSchema)]
pub struct ClientDoc {
    pub id: i32,
    pub mail_address: String,
    pub name: String,
    pub last_name: String,
    pub coach_id: i32,
    pub is_active: bool,
    pub is_pending: bool,
    /// Stored at `<clients_root>/<id>/diet_plan/<diet_plan>`
    pub diet_plan: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Accepted request fields. Create requires the first five; update takes any subset.
#[derive(ToSchema)]
pub struct ClientFieldsDoc {
    pub mail_address: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub coach_id: Option<i32>,
    pub is_active: Option<bool>,
    pub is_pending: Option<bool>,
    pub diet_plan: Option<String>,
}

#[derive(ToSchema)]
pub struct ClientEnvelopeDoc {
    /// `SUCCESS`, `FAILURE` or `ERROR`
    pub status: String,
    pub message: String,
    pub data: Option<ClientDoc>,
}

#[derive(ToSchema)]
pub struct ClientListEnvelopeDoc {
    pub status: String,
    pub message: String,
    pub data: Vec<ClientDoc>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::clients::list,
        crate::routes::clients::get,
        crate::routes::clients::create,
        crate::routes::clients::update,
        crate::routes::clients::delete,
    ),
    components(
        schemas(
            HealthResponse,
            ClientDoc,
            ClientFieldsDoc,
            ClientEnvelopeDoc,
            ClientListEnvelopeDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "clients")
    )
)]
pub struct ApiDoc;
