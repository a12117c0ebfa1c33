//! Login, registration and logout pages

use api::models::NewUser;
use tracing::info;

use crate::error::AppResult;
use crate::router::Route;
use crate::state::AppState;

/// Sign in and go to the feed
pub async fn login(state: &mut AppState, email: &str, password: &str) -> AppResult<()> {
    state.session.login(email, password).await?;
    state.navigate(Route::Feed);
    Ok(())
}

/// Create an account, sign in with it and go to the feed
pub async fn register(state: &mut AppState, form: &NewUser) -> AppResult<()> {
    state.session.register(form).await?;
    state.navigate(Route::Feed);
    Ok(())
}

/// Sign out and go to the login page
pub async fn logout(state: &mut AppState) -> AppResult<()> {
    state.session.logout().await?;
    state.navigator.to_login();
    info!("Signed out");
    Ok(())
}
