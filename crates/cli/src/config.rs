pub use homekeep_core::config::*;

use homekeep_core::session::{Identity, StaticAuth};

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    AppConfig::discover(cli.data_dir.clone())
}

/// Identity taken from `--user`/`--email`. The email defaults to the user id.
pub fn auth_from_cli(cli: &Cli) -> StaticAuth {
    let identity = cli
        .user
        .as_deref()
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(|uid| {
            let email = cli
                .email
                .clone()
                .filter(|email| !email.trim().is_empty())
                .unwrap_or_else(|| uid.to_string());
            Identity::new(uid, email.trim())
        });
    StaticAuth::new(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use homekeep_core::session::AuthProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_comes_from_flags() {
        let cli = Cli::try_parse_from([
            "homekeep", "--user", "u7", "--email", "mo@example.com", "home", "show",
        ])
        .unwrap();
        let identity = auth_from_cli(&cli).current_identity().unwrap();
        assert_eq!(identity.uid, "u7");
        assert_eq!(identity.email, "mo@example.com");
        assert_eq!(identity.preferred_name(), "mo");
    }

    #[test]
    fn blank_user_means_signed_out() {
        let cli = Cli::try_parse_from(["homekeep", "--user", " ", "home", "show"]).unwrap();
        assert!(auth_from_cli(&cli).current_identity().is_none());
    }
}
