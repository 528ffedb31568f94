// Session store keys, scoped per account e-mail
pub const TOKEN: &str = "token";

pub const SESSION_DB_PATH: &str = "session-db/sessions.db";
