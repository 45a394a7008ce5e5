//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Command-line client for the AntiqBot antiques appraisal service.
#[derive(Parser, Debug)]
#[command(name = "antiqbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true, env = "ANTIQBOT_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in (password is prompted)
    Login {
        /// Defaults to the last email used
        email: Option<String>,
    },
    /// Create an account (password is prompted)
    Register {
        email: String,
        first_name: String,
        last_name: String,
    },
    /// Forget the stored session
    Logout,
    /// Show profile and credit balance
    #[command(name = "whoami")]
    WhoAmI,
    /// Request a password reset mail
    ForgotPassword { email: String },
    /// Set a new password with a reset token
    ResetPassword { token: String },
    /// Request a verification mail, or verify with a token
    VerifyEmail { token: Option<String> },
    /// Show credit balance
    Credits,
    /// List credit packages
    Packages,
    /// Purchase a credit package
    Buy { package_id: String },
    /// Appraise an image (costs one credit)
    Analyze {
        #[arg(value_name = "IMAGE")]
        image: String,
        /// Optional comment sent along with the image
        #[arg(trailing_var_arg = true)]
        comment: Vec<String>,
    },
    /// List previous appraisals
    History,
    /// Show one appraisal
    Show { id: String },
    /// Delete an appraisal
    Delete { id: String },
    /// Send feedback
    Feedback {
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Contact support
    Support {
        subject: String,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show admin statistics
    Stats,
}

impl Command {
    /// Whether the command needs a logged-in session
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Command::WhoAmI
                | Command::Credits
                | Command::Buy { .. }
                | Command::Analyze { .. }
                | Command::History
                | Command::Show { .. }
                | Command::Delete { .. }
                | Command::Stats
                | Command::VerifyEmail { token: None }
        )
    }
}
