//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations/` exactly.
//! `schema_migrations` is created by the migration ledger itself rather than
//! by a migration file.

diesel::table! {
    /// Votes received from the queue.
    ///
    /// Rows are written with unconditional upserts keyed on `id`.
    votes (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Participant the vote was cast for.
        participant_id -> Int8,
        /// Voting session identifier.
        session_id -> Text,
        /// Event time reported by the producer.
        timestamp -> Timestamptz,
        /// Lifecycle status in its textual form.
        status -> Text,
        /// When the vote reached `PROCESSED`.
        processed_at -> Nullable<Timestamptz>,
        /// Last processing error message.
        processing_error -> Nullable<Text>,
        /// Record creation timestamp; never overwritten by upserts.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ledger of applied schema migrations.
    schema_migrations (version) {
        /// Version prefix of the migration file.
        version -> Varchar,
        /// Remainder of the file name.
        name -> Varchar,
        /// Commit time of the migration transaction.
        executed_at -> Timestamptz,
    }
}
