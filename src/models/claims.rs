use uuid::Uuid;

/// Verified identity attributes extracted from a bearer token.
///
/// Exists only for the duration of one request. `local_user_id` is attached
/// by the session resolver when a matching local user row exists; `None`
/// means "no local record yet" and provisioning may mint one.
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub groups: Vec<String>,
    pub local_user_id: Option<Uuid>,
}
