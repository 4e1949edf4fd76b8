pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS couples (
    id TEXT PRIMARY KEY,
    partner_a TEXT NOT NULL,
    partner_b TEXT,
    anniversary TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invites (
    code TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    redeemed_at TEXT
);

CREATE TABLE IF NOT EXISTS quests (
    id TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    created_by TEXT NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'in_progress', 'completed')),
    kind TEXT NOT NULL CHECK (kind IN ('challenge', 'routine')),
    start_date TEXT,
    end_date TEXT,
    restrictions TEXT,
    frequency TEXT CHECK (frequency IN ('daily', 'weekly')),
    weekly_goal INTEGER,
    streak INTEGER NOT NULL DEFAULT 0,
    last_completed_date TEXT,
    completed_this_week JSON NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    created_by TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    memory_date TEXT NOT NULL,
    photo_url TEXT,
    location TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    created_by TEXT NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    date TEXT,
    notes TEXT,
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS discoveries (
    id TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    shared_by TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    image_url TEXT,
    kind TEXT NOT NULL DEFAULT 'other' CHECK (kind IN ('article', 'song', 'video', 'place', 'other')),
    reaction TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_connections (
    id TEXT PRIMARY KEY,
    couple_id TEXT NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    question TEXT NOT NULL,
    answers JSON NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invites_couple ON invites(couple_id);
CREATE INDEX IF NOT EXISTS idx_quests_couple ON quests(couple_id);
CREATE INDEX IF NOT EXISTS idx_memories_couple ON memories(couple_id);
CREATE INDEX IF NOT EXISTS idx_activities_couple ON activities(couple_id);
CREATE INDEX IF NOT EXISTS idx_discoveries_couple ON discoveries(couple_id);
CREATE INDEX IF NOT EXISTS idx_connections_couple ON daily_connections(couple_id);

-- One connection question per couple per day
CREATE UNIQUE INDEX IF NOT EXISTS idx_one_connection_per_day
    ON daily_connections(couple_id, day);
"#;
