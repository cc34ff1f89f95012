//! Argument parsing and credential resolution. The rest of the shell only
//! sees the resolved [`ConnectionParams`]; how the password was obtained
//! (flag, environment, `.pgpass`, interactive prompt) stays here.

use crate::db::ConnectionParams;
use crate::pgpass;
use clap::Parser;

/// pgsh - a lightweight interactive PostgreSQL shell
#[derive(Parser, Clone)]
#[command(name = "pgsh")]
#[command(version, about = "A lightweight interactive PostgreSQL shell")]
pub struct Args {
    /// Database name to connect to
    #[arg(short, long, env = "PGDATABASE", default_value = "postgres")]
    pub dbname: String,

    /// Database user
    #[arg(short = 'U', long, env = "PGUSER", default_value = "postgres")]
    pub user: String,

    /// Server host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "PGPORT", default_value_t = 5432)]
    pub port: u16,

    /// Password (otherwise resolved from ~/.pgpass, then prompted for)
    #[arg(short = 'W', long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Execute the given command string and exit; may be repeated
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub command: Vec<String>,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("command", &self.command)
            .finish()
    }
}

impl Args {
    /// Resolve the full connection tuple. Resolution order for the password:
    /// `-W`/`PGPASSWORD`, then the `.pgpass` file, then an interactive prompt.
    pub fn connection_params(&self) -> std::io::Result<ConnectionParams> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => match pgpass::lookup(&self.host, self.port, &self.dbname, &self.user) {
                Some(password) => password,
                None => rpassword::prompt_password(format!("Password for user {}: ", self.user))?,
            },
        };

        Ok(ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password,
            database: self.dbname.clone(),
        })
    }
}
