//! Admin tool for the user database: create users and manage their password
//! logins. Operates directly on the SQLite file, the server does not need to
//! be running.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ytm_mirror_server::user::{
    SqliteUserStore, UserAuthCredentials, UserAuthCredentialsStore, UserStore,
    UsernamePasswordCredentials,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite user database file.
    #[clap(value_parser = parse_path)]
    pub user_db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a user with the given handle.
    AddUser { user_handle: String },

    /// Creates a password authentication for the given user.
    /// Fails if the user already has a password set.
    AddLogin {
        user_handle: String,
        password: String,
    },

    /// Change the password of a user, fails if no password was set.
    UpdateLogin {
        user_handle: String,
        password: String,
    },

    /// Deletes the password authentication for a given user.
    DeleteLogin { user_handle: String },

    /// Verifies the password of a given user, it doesn't make any
    /// persistent change, nor it creates any token, it just
    /// compares the password hash.
    CheckPassword {
        user_handle: String,
        password: String,
    },

    /// Shows authentication information of a given user.
    Show { user_handle: String },

    /// Shows all user handles.
    UserHandles,
}

fn require_credentials(store: &SqliteUserStore, user_handle: &str) -> Result<UserAuthCredentials> {
    store
        .get_user_auth_credentials(user_handle)?
        .with_context(|| format!("User {} not found", user_handle))
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let store = SqliteUserStore::new(&cli_args.user_db)?;

    match cli_args.command {
        Command::AddUser { user_handle } => {
            let user_id = store.create_user(&user_handle)?;
            println!("Created user {} with id {}", user_handle, user_id);
        }

        Command::AddLogin {
            user_handle,
            password,
        } => {
            let credentials = require_credentials(&store, &user_handle)?;
            if credentials.username_password.is_some() {
                bail!("User {} already has a password set", user_handle);
            }
            store.update_user_auth_credentials(UserAuthCredentials {
                user_id: credentials.user_id,
                username_password: Some(UsernamePasswordCredentials::from_password(
                    credentials.user_id,
                    &password,
                )?),
            })?;
            println!("Password login created for {}", user_handle);
        }

        Command::UpdateLogin {
            user_handle,
            password,
        } => {
            let credentials = require_credentials(&store, &user_handle)?;
            if credentials.username_password.is_none() {
                bail!("User {} has no password set", user_handle);
            }
            store.update_user_auth_credentials(UserAuthCredentials {
                user_id: credentials.user_id,
                username_password: Some(UsernamePasswordCredentials::from_password(
                    credentials.user_id,
                    &password,
                )?),
            })?;
            println!("Password updated for {}", user_handle);
        }

        Command::DeleteLogin { user_handle } => {
            let credentials = require_credentials(&store, &user_handle)?;
            store.update_user_auth_credentials(UserAuthCredentials {
                user_id: credentials.user_id,
                username_password: None,
            })?;
            println!("Password login deleted for {}", user_handle);
        }

        Command::CheckPassword {
            user_handle,
            password,
        } => {
            let credentials = require_credentials(&store, &user_handle)?;
            let password_credentials = credentials
                .username_password
                .with_context(|| format!("User {} has no password set", user_handle))?;
            let msg = match password_credentials
                .hasher
                .verify(&password, &password_credentials.hash)
            {
                Ok(true) => "The password provided is correct!",
                Ok(false) => "Wrong password.",
                Err(err) => &format!(
                    "Could not verify the password, something went wrong: {}",
                    err
                ),
            };
            println!("{}", msg);
        }

        Command::Show { user_handle } => {
            let credentials = require_credentials(&store, &user_handle)?;
            println!("User id: {}", credentials.user_id);
            println!(
                "Password login: {}",
                if credentials.username_password.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            match store.get_music_auth(credentials.user_id)? {
                Some(record) => println!("Music credentials file: {}", record.auth_file),
                None => println!("Music credentials file: not registered"),
            }
        }

        Command::UserHandles => {
            for handle in store.get_all_user_handles()? {
                println!("{}", handle);
            }
        }
    }

    Ok(())
}
