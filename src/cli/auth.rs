//! `signup`, `login` and `logout` commands.

use std::error::Error;

use tracing::info;

use crate::api::BackendClient;
use crate::core::session::{CredentialStore, SessionStore};
use crate::utils::prompt::{prompt_line, PromptError};

struct Credentials {
    email: String,
    password: String,
}

fn prompt_credentials() -> Result<Credentials, PromptError> {
    let email = prompt_line("Email: ", false)?.trim().to_string();
    let password = prompt_line("Password: ", true)?;
    Ok(Credentials { email, password })
}

fn validate(credentials: &Credentials) -> Result<(), Box<dyn Error>> {
    if credentials.email.is_empty() {
        return Err("Email is required".into());
    }
    if credentials.password.is_empty() {
        return Err("Password is required".into());
    }
    Ok(())
}

pub async fn run_signup(client: &BackendClient) -> Result<(), Box<dyn Error>> {
    println!("Create an account on {}", client.base_url());
    let credentials = prompt_credentials()?;
    validate(&credentials)?;

    client
        .signup(&credentials.email, &credentials.password)
        .await?;
    info!(email = %credentials.email, "account created");
    println!("✅ Account created! Please log in with 'threadline login'.");
    Ok(())
}

pub async fn run_login<S: CredentialStore>(
    client: &BackendClient,
    sessions: &mut SessionStore<S>,
) -> Result<(), Box<dyn Error>> {
    println!("Log in to {}", client.base_url());
    let credentials = prompt_credentials()?;
    validate(&credentials)?;

    let response = client
        .login(&credentials.email, &credentials.password)
        .await?;
    sessions.login(&response.access_token, &response.user_id)?;
    println!("✅ Logged in. Run 'threadline' to start chatting.");
    Ok(())
}

pub fn run_logout<S: CredentialStore>(sessions: &mut SessionStore<S>) -> Result<(), Box<dyn Error>> {
    let was_active = sessions.is_active();
    sessions.logout()?;
    if was_active {
        println!("✅ Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{MemoryCredentialStore, TOKEN_KEY, USER_ID_KEY};

    #[test]
    fn validate_requires_both_fields() {
        let missing_email = Credentials {
            email: String::new(),
            password: "pw".into(),
        };
        let missing_password = Credentials {
            email: "a@b.c".into(),
            password: String::new(),
        };
        assert_eq!(
            validate(&missing_email).expect_err("email").to_string(),
            "Email is required"
        );
        assert_eq!(
            validate(&missing_password).expect_err("password").to_string(),
            "Password is required"
        );
    }

    #[test]
    fn logout_clears_stored_session() {
        let store = MemoryCredentialStore::with_values([(TOKEN_KEY, "tok"), (USER_ID_KEY, "7")]);
        let mut sessions = SessionStore::restore(store).expect("restore");
        assert!(sessions.is_active());

        run_logout(&mut sessions).expect("logout");
        assert!(!sessions.is_active());
    }
}
