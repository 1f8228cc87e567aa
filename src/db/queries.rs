use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{AppError, Result};
use crate::ids;
use crate::models::{
    CartSnapshot, CreateOrder, LocalOrder, OrderMapping, OrderNote, OrderStatus, ShippingRate,
};
use crate::money;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============ Order mappings ============

/// Insert the mapping for a freshly created processor order. First writer
/// wins: a duplicate processor order id or public id fails the uniqueness
/// constraint and surfaces as `Conflict` so the caller can fall back to
/// fetch-existing. A write that affects zero rows is fatal.
pub fn insert_mapping(conn: &Connection, order_id: &str, public_id: &str) -> Result<()> {
    let packed_order = ids::pack(order_id)?;
    let packed_public = ids::pack(public_id)?;

    let rows = conn
        .execute(
            "INSERT INTO order_mappings (order_id, public_id, created_at) VALUES (?1, ?2, ?3)",
            params![packed_order.as_slice(), packed_public.as_slice(), now()],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                AppError::Conflict(format!("order mapping already exists for {}", order_id))
            } else {
                e.into()
            }
        })?;

    if rows != 1 {
        return Err(AppError::Internal(
            "order mapping insert affected no rows".to_string(),
        ));
    }

    Ok(())
}

/// Resolve the processor order id behind a public-facing id.
pub fn order_id_by_public_id(conn: &Connection, public_id: &str) -> Result<Option<String>> {
    let packed = ids::pack(public_id)?;
    let row: Option<Vec<u8>> = conn
        .query_row(
            "SELECT order_id FROM order_mappings WHERE public_id = ?1",
            params![packed.as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    row.map(|bytes| ids::unpack(&bytes)).transpose()
}

/// Resolve the public id behind a processor order id. Used by the
/// create-or-reuse fallback when a mapping insert loses the race.
pub fn public_id_by_order_id(conn: &Connection, order_id: &str) -> Result<Option<String>> {
    let packed = ids::pack(order_id)?;
    let row: Option<Vec<u8>> = conn
        .query_row(
            "SELECT public_id FROM order_mappings WHERE order_id = ?1",
            params![packed.as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    row.map(|bytes| ids::unpack(&bytes)).transpose()
}

/// Resolve the storefront order linked to a processor order, if one has
/// been placed yet.
pub fn local_order_id_by_order_id(conn: &Connection, order_id: &str) -> Result<Option<String>> {
    let packed = ids::pack(order_id)?;
    Ok(conn
        .query_row(
            "SELECT local_order_id FROM order_mappings WHERE order_id = ?1",
            params![packed.as_slice()],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .flatten())
}

pub fn get_mapping(conn: &Connection, order_id: &str) -> Result<Option<OrderMapping>> {
    let packed = ids::pack(order_id)?;
    let row = conn
        .query_row(
            "SELECT order_id, public_id, local_order_id, created_at
             FROM order_mappings WHERE order_id = ?1",
            params![packed.as_slice()],
            |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(order_id, public_id, local_order_id, created_at)| {
        Ok(OrderMapping {
            order_id: ids::unpack(&order_id)?,
            public_id: ids::unpack(&public_id)?,
            local_order_id,
            created_at,
        })
    })
    .transpose()
}

/// Link a mapping to the storefront order placed for it.
pub fn attach_order_mapping(conn: &Connection, order_id: &str, local_order_id: &str) -> Result<()> {
    let packed = ids::pack(order_id)?;
    let rows = conn.execute(
        "UPDATE order_mappings SET local_order_id = ?2 WHERE order_id = ?1",
        params![packed.as_slice(), local_order_id],
    )?;

    if rows != 1 {
        return Err(AppError::NotFound(format!(
            "no order mapping for processor order {}",
            order_id
        )));
    }

    Ok(())
}

/// Remove mapping rows that never got a storefront order. Administrative
/// only; normal flow never deletes mappings.
pub fn delete_orphaned_mappings(conn: &Connection) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM order_mappings WHERE local_order_id IS NULL OR local_order_id = ''",
        [],
    )?;
    Ok(rows)
}

// ============ Temp sessions (express checkout) ============

/// Insert-or-replace the cart snapshot for a processor order.
pub fn upsert_temp_session(
    conn: &Connection,
    order_id: &str,
    snapshot: &CartSnapshot,
) -> Result<()> {
    let packed = ids::pack(order_id)?;
    let serialized = serde_json::to_string(snapshot)?;

    conn.execute(
        "INSERT INTO temp_sessions (order_id, snapshot, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(order_id) DO UPDATE SET snapshot = excluded.snapshot,
                                             updated_at = excluded.updated_at",
        params![packed.as_slice(), serialized, now()],
    )?;

    Ok(())
}

pub fn get_temp_session(conn: &Connection, order_id: &str) -> Result<Option<CartSnapshot>> {
    let packed = ids::pack(order_id)?;
    let raw: Option<String> = conn
        .query_row(
            "SELECT snapshot FROM temp_sessions WHERE order_id = ?1",
            params![packed.as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|s| serde_json::from_str(&s).map_err(AppError::from))
        .transpose()
}

pub fn delete_temp_session(conn: &Connection, order_id: &str) -> Result<()> {
    let packed = ids::pack(order_id)?;
    conn.execute(
        "DELETE FROM temp_sessions WHERE order_id = ?1",
        params![packed.as_slice()],
    )?;
    Ok(())
}

// ============ Storefront orders ============

fn order_from_row(row: &Row) -> rusqlite::Result<LocalOrder> {
    let status: String = row.get(1)?;
    Ok(LocalOrder {
        id: row.get(0)?,
        status: status.parse().unwrap_or(OrderStatus::AwaitingPayment),
        currency: row.get(2)?,
        total_minor: row.get(3)?,
        customer_ref: row.get(4)?,
        transaction_id: row.get(5)?,
        captured: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const ORDER_COLUMNS: &str =
    "id, status, currency, total_minor, customer_ref, transaction_id, captured, created_at, updated_at";

pub fn create_order(conn: &Connection, input: &CreateOrder) -> Result<LocalOrder> {
    let id = uuid::Uuid::new_v4().to_string();
    let ts = now();
    let total_minor = money::to_processor_units(input.amount, &input.currency);

    conn.execute(
        "INSERT INTO orders (id, status, currency, total_minor, customer_ref, created_at, updated_at)
         VALUES (?1, 'awaiting_payment', ?2, ?3, ?4, ?5, ?5)",
        params![id, input.currency, total_minor, input.customer_ref, ts],
    )?;

    get_order(conn, &id)?
        .ok_or_else(|| AppError::Internal("order vanished after insert".to_string()))
}

pub fn get_order(conn: &Connection, id: &str) -> Result<Option<LocalOrder>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
            params![id],
            order_from_row,
        )
        .optional()?)
}

pub fn set_order_status(conn: &Connection, id: &str, status: OrderStatus) -> Result<()> {
    let rows = conn.execute(
        "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.to_string(), now()],
    )?;

    if rows != 1 {
        return Err(AppError::NotFound(format!("order {} not found", id)));
    }

    Ok(())
}

/// Atomic "mark paid" transition. All guards live in the WHERE clause so
/// two concurrent webhook deliveries (or a webhook racing the synchronous
/// checkout) cannot both pass: exactly one UPDATE affects a row.
///
/// Returns false when the order was already captured, already carries a
/// transaction id, or sits in an already-paid status.
pub fn try_capture_order(conn: &Connection, id: &str, transaction_id: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE orders SET captured = 1, transaction_id = ?2, status = 'processing', updated_at = ?3
         WHERE id = ?1
           AND captured = 0
           AND transaction_id IS NULL
           AND status NOT IN ('processing', 'completed')",
        params![id, transaction_id, now()],
    )?;

    Ok(rows == 1)
}

pub fn add_order_note(conn: &Connection, order_id: &str, note: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO order_notes (order_id, note, created_at) VALUES (?1, ?2, ?3)",
        params![order_id, note, now()],
    )?;
    Ok(())
}

pub fn list_order_notes(conn: &Connection, order_id: &str) -> Result<Vec<OrderNote>> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, note, created_at FROM order_notes
         WHERE order_id = ?1 ORDER BY id",
    )?;

    let notes = stmt
        .query_map(params![order_id], |row| {
            Ok(OrderNote {
                id: row.get(0)?,
                order_id: row.get(1)?,
                note: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(notes)
}

// ============ Shipping rates ============

pub fn insert_shipping_rate(conn: &Connection, rate: &ShippingRate) -> Result<()> {
    conn.execute(
        "INSERT INTO shipping_rates (id, country, method_id, label, amount_minor, currency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rate.id,
            rate.country.to_uppercase(),
            rate.method_id,
            rate.label,
            rate.amount_minor,
            rate.currency
        ],
    )?;
    Ok(())
}

pub fn shipping_rates_for_country(conn: &Connection, country: &str) -> Result<Vec<ShippingRate>> {
    let mut stmt = conn.prepare(
        "SELECT id, country, method_id, label, amount_minor, currency
         FROM shipping_rates WHERE country = ?1 ORDER BY amount_minor",
    )?;

    let rates = stmt
        .query_map(params![country.to_uppercase()], |row| {
            Ok(ShippingRate {
                id: row.get(0)?,
                country: row.get(1)?,
                method_id: row.get(2)?,
                label: row.get(3)?,
                amount_minor: row.get(4)?,
                currency: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rates)
}
