use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub branchid: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub branchid: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = documents)]
pub struct Document {
    pub id: String,
    pub document_type: String,
    pub document_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub notes: Option<String>,
    pub action: Option<String>,
    pub status: String,
    pub document_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument {
    pub id: String,
    pub document_type: String,
    pub document_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub notes: Option<String>,
    pub action: Option<String>,
    pub status: String,
    pub document_date: Option<NaiveDate>,
}
