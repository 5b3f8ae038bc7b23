use crate::cli::{Cli, UsersAction};
use crate::commands::{load_config, open_store, read_password, require_user, token_gate, Result};
use crate::output::{format_output, OutputData};
use nexus_core::auth::AuthError;
use nexus_core::store::NewUser;
use tracing::info;

pub async fn run(cli: &Cli, action: UsersAction) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(&config).await?;

    let output = match action {
        UsersAction::Signup {
            email,
            password,
            display_name,
            username,
        } => {
            let password = match password {
                Some(p) => p,
                None => read_password("Password: ")?,
            };
            let user = store
                .create_user(NewUser {
                    email,
                    password,
                    display_name,
                    username,
                })
                .await?;
            let token = token_gate(&config)?.issue(&user.id, &user.email)?;
            info!(user_id = %user.id, "Signed up");
            OutputData::Session { user, token }
        }
        UsersAction::Signin { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password("Password: ")?,
            };
            let user = store
                .authenticate(&email, &password)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;
            let token = token_gate(&config)?.issue(&user.id, &user.email)?;
            OutputData::Session { user, token }
        }
        UsersAction::Me { token } => {
            let user_id = require_user(&config, token.as_deref())?;
            OutputData::User(store.get_user(&user_id).await?)
        }
    };

    format_output(&output, &cli.output)
}
