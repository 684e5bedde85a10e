//! Authentication and profile commands.

use clap::Subcommand;

use souk_client::Souk;

use super::CliError;

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password (min 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Log out and revoke the refresh token
    Logout,
    /// Show the authenticated user
    Whoami,
    /// Request a password-reset email
    ForgotPassword {
        /// Account email
        #[arg(short, long)]
        email: String,
    },
}

pub async fn run(souk: &Souk, action: AuthCommand) -> Result<(), CliError> {
    match action {
        AuthCommand::Login { email, password } => {
            let user = souk.session().login(&email, &password).await?;
            print_line(&format!("Logged in as {} <{}>", user.name, user.email));
        }
        AuthCommand::Register {
            name,
            email,
            password,
        } => {
            let user = souk.session().register(&name, &email, &password).await?;
            print_line(&format!("Account created for {} <{}>", user.name, user.email));
        }
        AuthCommand::Logout => {
            souk.session().logout();
            print_line("Logged out");
        }
        AuthCommand::Whoami => match souk.session().current_user() {
            Some(user) => {
                print_line(&format!(
                    "{} <{}> ({:?})",
                    user.name, user.email, user.role
                ));
            }
            None => print_line("Not logged in"),
        },
        AuthCommand::ForgotPassword { email } => {
            souk.session().forgot_password(&email).await?;
            print_line("Password-reset email requested");
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub(crate) fn print_line(line: &str) {
    println!("{line}");
}
