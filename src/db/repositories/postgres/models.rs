use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{schools, slots, tours};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct SchoolRow {
    pub school_id: i64,
    pub school_name: String,
    pub city: String,
    pub persistence_score: i32,
    pub quality_score: i32,
    pub city_distance_km: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schools)]
pub struct NewSchoolRow {
    pub school_name: String,
    pub city: String,
    pub persistence_score: i32,
    pub quality_score: i32,
    pub city_distance_km: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tours)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TourRow {
    pub tour_id: i64,
    pub tour_code: String,
    pub kind: String,
    pub school_id: Option<i64>,
    pub city: String,
    pub priority: i32,
    pub guide_id: Option<i64>,
    pub checksum: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tours)]
pub struct NewTourRow {
    pub tour_code: String,
    pub kind: String,
    pub school_id: Option<i64>,
    pub city: String,
    pub priority: i32,
    pub guide_id: Option<i64>,
    pub checksum: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct SlotRow {
    pub slot_id: i64,
    pub visit_day: NaiveDate,
    pub slot_index: i16,
    pub max_admitted: i32,
    pub next_seq: i64,
    pub admitted_json: Value,
    pub waitlisted_json: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slots)]
pub struct NewSlotRow {
    pub slot_id: i64,
    pub visit_day: NaiveDate,
    pub slot_index: i16,
    pub max_admitted: i32,
    pub next_seq: i64,
    pub admitted_json: Value,
    pub waitlisted_json: Value,
}
