/// Database row types — these map directly to SQLite rows.
/// Distinct from the account aggregate to keep the DB layer independent.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub password: String,
    pub timezone: i32,
    pub autologin_id: Option<i64>,
    pub flags: i64,
    pub forum_id: i64,
}

/// Identity fields for an account that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountRow<'a> {
    pub login: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub timezone: i32,
    pub autologin_id: Option<i64>,
    pub flags: i64,
    pub forum_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPlayerRow {
    pub account_id: i64,
    pub char_id: i64,
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountForumRow {
    /// `None` until the row has been written once.
    pub id: Option<i64>,
    pub account_id: i64,
    pub forum_id: i64,
    /// Unix seconds; 0 means nothing read.
    pub last_note: i64,
    pub unsubscribed: bool,
    pub draft: Option<String>,
}
