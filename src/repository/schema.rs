//! Diesel table definitions and the SQL that creates them.

diesel::table! {
    tower_categories (id) {
        id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
        thumbnail_url -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tower_variants (id) {
        id -> Integer,
        tower_code -> Text,
        height -> Double,
        structural_type -> Text,
        load_class -> Nullable<Text>,
        engineering_notes -> Nullable<Text>,
        category_id -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tower_documents (id) {
        id -> Integer,
        variant_id -> Integer,
        pdf_url -> Text,
        page_count -> Integer,
        file_size -> BigInt,
        version -> Text,
        upload_timestamp -> Text,
        is_active -> Bool,
    }
}

diesel::table! {
    sliders (id) {
        id -> Integer,
        title -> Text,
        description -> Nullable<Text>,
        image_url -> Text,
        link_url -> Nullable<Text>,
        display_order -> Integer,
        is_active -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    visitor_stats (id) {
        id -> Integer,
        total_visits -> BigInt,
        last_visit -> Nullable<Text>,
    }
}

diesel::joinable!(tower_variants -> tower_categories (category_id));
diesel::joinable!(tower_documents -> tower_variants (variant_id));

diesel::allow_tables_to_appear_in_same_query!(
    tower_categories,
    tower_variants,
    tower_documents,
    sliders,
    visitor_stats,
);

/// Schema creation, idempotent.
pub(crate) const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tower_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        thumbnail_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tower_variants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tower_code TEXT NOT NULL UNIQUE,
        height REAL NOT NULL,
        structural_type TEXT NOT NULL,
        load_class TEXT,
        engineering_notes TEXT,
        category_id INTEGER NOT NULL
            REFERENCES tower_categories(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tower_documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        variant_id INTEGER NOT NULL
            REFERENCES tower_variants(id) ON DELETE CASCADE,
        pdf_url TEXT NOT NULL,
        page_count INTEGER NOT NULL DEFAULT 0,
        file_size INTEGER NOT NULL DEFAULT 0,
        version TEXT NOT NULL DEFAULT '1.0',
        upload_timestamp TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS sliders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        image_url TEXT NOT NULL,
        link_url TEXT,
        display_order INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS visitor_stats (
        id INTEGER PRIMARY KEY,
        total_visits INTEGER NOT NULL DEFAULT 0,
        last_visit TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_tower_variants_category
        ON tower_variants(category_id);
    CREATE INDEX IF NOT EXISTS idx_tower_variants_height
        ON tower_variants(height);
    CREATE INDEX IF NOT EXISTS idx_tower_variants_structural_type
        ON tower_variants(structural_type);
    CREATE INDEX IF NOT EXISTS idx_tower_documents_variant
        ON tower_documents(variant_id, upload_timestamp);

    -- At most one active document per variant
    CREATE UNIQUE INDEX IF NOT EXISTS idx_tower_documents_one_active
        ON tower_documents(variant_id) WHERE is_active = 1;
"#;
