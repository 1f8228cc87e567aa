use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Storefront orders this service reconciles payment state against.
        -- captured is the webhook idempotency flag, independent of status.
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'awaiting_payment'
                CHECK (status IN ('awaiting_payment', 'processing', 'completed', 'cancelled', 'failed')),
            currency TEXT NOT NULL,
            total_minor INTEGER NOT NULL,
            customer_ref TEXT,
            transaction_id TEXT,
            captured INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Append-only audit notes (payment captured, method used, etc.)
        CREATE TABLE IF NOT EXISTS order_notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            note TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_notes_order ON order_notes(order_id);

        -- Processor order id <-> storefront order. Identifiers are packed
        -- 16-byte UUIDs (hyphens stripped, hex-decoded) to keep the
        -- uniqueness indexes compact. local_order_id stays NULL until a
        -- storefront order is placed for the session.
        CREATE TABLE IF NOT EXISTS order_mappings (
            order_id BLOB PRIMARY KEY,
            public_id BLOB NOT NULL UNIQUE,
            local_order_id TEXT REFERENCES orders(id),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_mappings_local ON order_mappings(local_order_id);

        -- Express-checkout cart snapshots, keyed by packed processor order
        -- id. Insert-or-replace on every session create/update.
        CREATE TABLE IF NOT EXISTS temp_sessions (
            order_id BLOB PRIMARY KEY,
            snapshot TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Operator-configured delivery methods per country, consulted by
        -- the address-validation webhook.
        CREATE TABLE IF NOT EXISTS shipping_rates (
            id TEXT PRIMARY KEY,
            country TEXT NOT NULL,
            method_id TEXT NOT NULL,
            label TEXT NOT NULL,
            amount_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            UNIQUE(country, method_id)
        );
        CREATE INDEX IF NOT EXISTS idx_shipping_rates_country ON shipping_rates(country);
        "#,
    )
}
