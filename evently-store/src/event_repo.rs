use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use evently_domain::error::{Error, Result};
use evently_domain::event::{Event, EventFilter, EventPatch, NewEvent, PageOf, PageRequest};
use evently_domain::ids;
use evently_domain::repository::EventCatalog;

use crate::database::storage_err;

pub struct PgEventCatalog {
    pool: PgPool,
}

impl PgEventCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str = "id, code, title, description, category, location, location_type, \
     date, start_time, end_time, capacity, price, image, created_by, created_at";

// Internal struct for type-safe querying; enums travel as TEXT.
#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub location_type: String,
    pub date: chrono::DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    pub price: i64,
    pub image: Option<String>,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Event {
            id: row.id,
            code: row.code,
            title: row.title,
            description: row.description,
            category: row.category.parse()?,
            location: row.location,
            location_type: row.location_type.parse()?,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            price: row.price,
            image: row.image,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

pub(crate) async fn fetch_event<'e, E>(executor: E, id: Uuid) -> Result<Option<Event>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(storage_err)?;

    row.map(Event::try_from).transpose()
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    let mut prefix = " WHERE ";
    if let Some(category) = filter.category {
        qb.push(prefix).push("category = ").push_bind(category.to_string());
        prefix = " AND ";
    }
    if let Some(location_type) = filter.location_type {
        qb.push(prefix)
            .push("location_type = ")
            .push_bind(location_type.to_string());
        prefix = " AND ";
    }
    if let Some(day) = filter.day {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        qb.push(prefix)
            .push("date >= ")
            .push_bind(start)
            .push(" AND date < ")
            .push_bind(end);
    }
}

#[async_trait]
impl EventCatalog for PgEventCatalog {
    async fn create(&self, new: NewEvent, created_by: Uuid) -> Result<Event> {
        new.validate()?;

        let event = Event {
            id: Uuid::new_v4(),
            code: ids::event_code(),
            title: new.title,
            description: new.description,
            category: new.category,
            location: new.location,
            location_type: new.location_type,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            capacity: new.capacity,
            price: new.price,
            image: new.image,
            created_by,
            created_at: Utc::now(),
        };

        sqlx::query(&format!(
            "INSERT INTO events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ))
        .bind(event.id)
        .bind(&event.code)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.to_string())
        .bind(&event.location)
        .bind(event.location_type.to_string())
        .bind(event.date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .bind(event.capacity)
        .bind(event.price)
        .bind(&event.image)
        .bind(event.created_by)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(event)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>> {
        fetch_event(&self.pool, id).await
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event> {
        patch.validate()?;

        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                location = COALESCE($5, location), \
                location_type = COALESCE($6, location_type), \
                date = COALESCE($7, date), \
                start_time = COALESCE($8, start_time), \
                end_time = COALESCE($9, end_time), \
                capacity = COALESCE($10, capacity), \
                price = COALESCE($11, price), \
                image = COALESCE($12, image) \
             WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.category.map(|c| c.to_string()))
        .bind(patch.location)
        .bind(patch.location_type.map(|t| t.to_string()))
        .bind(patch.date)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(patch.capacity)
        .bind(patch.price)
        .bind(patch.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.ok_or(Error::EventNotFound)?.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Lock the event row so a concurrent admission cannot slip a booking
        // in between the reference count and the delete.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_err)?;
        if locked.is_none() {
            return Err(Error::EventNotFound);
        }

        // Any booking, confirmed or cancelled, blocks deletion.
        let bookings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE event_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage_err)?;
        if bookings > 0 {
            return Err(Error::EventHasBookings);
        }

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)
    }

    async fn list(&self, filter: &EventFilter, page: PageRequest) -> Result<PageOf<Event>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM events");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let mut qb = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY date ASC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<EventRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        let items = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(PageOf {
            items,
            total: total.max(0) as u64,
        })
    }
}
