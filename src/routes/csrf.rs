use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::auth::csrf;

#[derive(Serialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

/// Issues a fresh token for the caller's session.
pub async fn issue(jar: CookieJar) -> (CookieJar, Json<CsrfResponse>) {
    let token = csrf::generate_token();
    (
        jar.add(csrf::token_cookie(&token)),
        Json(CsrfResponse { csrf_token: token }),
    )
}
