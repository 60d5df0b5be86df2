use sqlx::PgPool;

use crate::{
    models::rsvp::{NewRsvp, Rsvp, RsvpError},
    services::metrics::RSVP_COUNTER,
};

const RSVP_COLS: &str = "id, name, email, attending, needs_pickup, arrival_date, return_date,
     bringing_guest, outfit_help, whatsapp, access_group, created_at";

pub struct RsvpService;

impl RsvpService {
    /// Every submission becomes a new row; there is no update path.
    pub async fn create(pool: &PgPool, rsvp: &NewRsvp) -> Result<Rsvp, RsvpError> {
        let row = sqlx::query_as::<_, Rsvp>(&format!(
            "INSERT INTO rsvps
             (name, email, attending, needs_pickup, arrival_date, return_date,
              bringing_guest, outfit_help, whatsapp, access_group)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {RSVP_COLS}"
        ))
        .bind(&rsvp.name)
        .bind(&rsvp.email)
        .bind(rsvp.attending.as_str())
        .bind(rsvp.needs_pickup.as_str())
        .bind(rsvp.arrival_date)
        .bind(rsvp.return_date)
        .bind(rsvp.bringing_guest.as_str())
        .bind(rsvp.outfit_help.as_str())
        .bind(&rsvp.whatsapp)
        .bind(rsvp.group.key())
        .fetch_one(pool)
        .await?;

        RSVP_COUNTER
            .with_label_values(&[rsvp.group.key(), rsvp.attending.as_str()])
            .inc();
        Ok(row)
    }
}
