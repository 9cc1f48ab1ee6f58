/// The schema the live database is migrated to on startup. `users` and
/// `user_sessions` are populated by the identity provider.
pub const CURRENT_SCHEMA: &str = r#"
PRAGMA foreign_keys = 1;
PRAGMA user_version = 2;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    token TEXT NOT NULL UNIQUE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    expires_at TIMESTAMP NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY,
    coach_user_id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    coach_name TEXT,
    contact_email TEXT,
    logo_path TEXT,
    city TEXT,
    state TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (coach_user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS wrestlers (
    id INTEGER PRIMARY KEY,
    parent_user_id INTEGER NOT NULL,
    athlete_user_id INTEGER,
    first_name TEXT NOT NULL,
    last_name TEXT,
    city TEXT,
    state TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (parent_user_id) REFERENCES users (id),
    FOREIGN KEY (athlete_user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS coach_needs (
    id INTEGER PRIMARY KEY,
    coach_user_id INTEGER NOT NULL,
    event_name TEXT NOT NULL,
    event_date DATE,
    weight_class TEXT NOT NULL,
    age_group TEXT NOT NULL,
    age_group_normalized TEXT NOT NULL,
    city TEXT,
    state TEXT,
    notes TEXT,
    is_open BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (coach_user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS wrestler_interests (
    id INTEGER PRIMARY KEY,
    wrestler_id INTEGER NOT NULL,
    event_name TEXT,
    event_date DATE,
    weight_class TEXT NOT NULL,
    age_group TEXT NOT NULL,
    age_group_normalized TEXT NOT NULL,
    notes TEXT,
    parent_ok BOOLEAN NOT NULL DEFAULT FALSE,
    coach_ok BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (wrestler_id) REFERENCES wrestlers (id)
);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY,
    coach_need_id INTEGER NOT NULL,
    wrestler_interest_id INTEGER NOT NULL,
    coach_user_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'declined', 'cancelled')),
    coach_ok BOOLEAN NOT NULL DEFAULT FALSE,
    parent_ok BOOLEAN NOT NULL DEFAULT FALSE,
    confirmed_at TIMESTAMP,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (coach_need_id) REFERENCES coach_needs (id),
    FOREIGN KEY (wrestler_interest_id) REFERENCES wrestler_interests (id),
    FOREIGN KEY (coach_user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    match_id INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    receiver_id INTEGER,
    text TEXT NOT NULL,
    sent_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    read_at TIMESTAMP,
    FOREIGN KEY (match_id) REFERENCES matches (id),
    FOREIGN KEY (sender_id) REFERENCES users (id)
);

-- one live match per pair; declined and cancelled rows fall outside the index
CREATE UNIQUE INDEX IF NOT EXISTS uq_matches_active_pair
    ON matches (coach_need_id, wrestler_interest_id)
    WHERE status IN ('pending', 'confirmed');

CREATE INDEX IF NOT EXISTS idx_matches_coach_user ON matches (coach_user_id, status);
CREATE INDEX IF NOT EXISTS idx_matches_interest ON matches (wrestler_interest_id);
CREATE INDEX IF NOT EXISTS idx_messages_match ON messages (match_id, sent_at);
CREATE INDEX IF NOT EXISTS idx_coach_needs_lookup
    ON coach_needs (weight_class, age_group_normalized, is_open);
CREATE INDEX IF NOT EXISTS idx_wrestler_interests_lookup
    ON wrestler_interests (weight_class, age_group_normalized);
"#;
