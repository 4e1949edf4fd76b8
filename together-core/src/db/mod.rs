mod schema;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::*;

/// Handle to the SQLite store. Cheap to clone; all access serializes
/// through one connection, which matches the single-client write pattern
/// (the store, not the client, is the source of truth for every row).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database in the platform data directory, creating it on
    /// first run.
    pub fn open_default() -> DbResult<Self> {
        let dirs = directories::ProjectDirs::from("com", "together-apart", "together-apart")
            .ok_or(DbError::NoDataDir)?;
        std::fs::create_dir_all(dirs.data_dir())?;
        Self::open(dirs.data_dir().join("together.db"))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> DbResult<()> {
        self.conn().execute_batch(schema::SCHEMA)?;
        tracing::debug!("database migrated");
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ----- couples & invites -----

    pub fn create_couple(&self, user_id: Uuid, input: CreateCoupleInput) -> DbResult<Couple> {
        let couple = Couple {
            id: Uuid::new_v4(),
            partner_a: user_id,
            partner_b: None,
            anniversary: input.anniversary,
            created_at: Utc::now(),
        };
        self.conn().execute(
            "INSERT INTO couples (id, partner_a, partner_b, anniversary, created_at)
             VALUES (?1, ?2, NULL, ?3, ?4)",
            params![
                couple.id.to_string(),
                couple.partner_a.to_string(),
                couple.anniversary.map(|d| d.to_string()),
                couple.created_at.to_rfc3339(),
            ],
        )?;
        Ok(couple)
    }

    pub fn get_couple(&self, id: Uuid) -> DbResult<Option<Couple>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, partner_a, partner_b, anniversary, created_at
                 FROM couples WHERE id = ?1",
                params![id.to_string()],
                couple_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// The couple a user belongs to, on either partner slot. `None` is the
    /// expected "not connected yet" state, not an error.
    pub fn get_couple_for_user(&self, user_id: Uuid) -> DbResult<Option<Couple>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, partner_a, partner_b, anniversary, created_at
                 FROM couples WHERE partner_a = ?1 OR partner_b = ?1",
                params![user_id.to_string()],
                couple_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn update_couple(&self, id: Uuid, input: UpdateCoupleInput) -> DbResult<Couple> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE couples SET anniversary = COALESCE(?2, anniversary) WHERE id = ?1",
            params![id.to_string(), input.anniversary.map(|d| d.to_string())],
        )?;
        if changed == 0 {
            return Err(DbError::not_found("couple"));
        }
        conn.query_row(
            "SELECT id, partner_a, partner_b, anniversary, created_at
             FROM couples WHERE id = ?1",
            params![id.to_string()],
            couple_from_row,
        )
        .map_err(Into::into)
    }

    pub fn create_invite(&self, couple_id: Uuid, created_by: Uuid) -> DbResult<Invite> {
        // One retry on the (unlikely) code collision; a second collision
        // propagates the constraint error.
        let mut attempt = 0;
        loop {
            let invite = Invite {
                code: new_invite_code(),
                couple_id,
                created_by,
                created_at: Utc::now(),
                redeemed_at: None,
            };
            let result = self.conn().execute(
                "INSERT INTO invites (code, couple_id, created_by, created_at, redeemed_at)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                params![
                    invite.code,
                    invite.couple_id.to_string(),
                    invite.created_by.to_string(),
                    invite.created_at.to_rfc3339(),
                ],
            );
            match result {
                Ok(_) => return Ok(invite),
                Err(err) if attempt == 0 => {
                    tracing::warn!(%err, "invite insert failed, regenerating code");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn get_invite(&self, code: &str) -> DbResult<Option<Invite>> {
        let row = self
            .conn()
            .query_row(
                "SELECT code, couple_id, created_by, created_at, redeemed_at
                 FROM invites WHERE code = ?1",
                params![code],
                invite_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Redeems an invite code, filling the couple's second partner slot.
    /// An unknown or already-redeemed code resolves to `NotFound`, which
    /// callers render as the "invalid invite" empty state.
    pub fn join_by_code(&self, code: &str, user_id: Uuid) -> DbResult<Couple> {
        let invite = self
            .get_invite(code)?
            .filter(|inv| inv.redeemed_at.is_none())
            .ok_or_else(|| DbError::not_found("invite"))?;

        let now = Utc::now();
        {
            let conn = self.conn();
            let claimed = conn.execute(
                "UPDATE couples SET partner_b = ?2 WHERE id = ?1 AND partner_b IS NULL",
                params![invite.couple_id.to_string(), user_id.to_string()],
            )?;
            // The slot can be filled between issuing and redeeming an
            // invite; a claim that lands second must not mark the code
            // redeemed or hand back a couple the joiner is not part of.
            if claimed == 0 {
                return Err(DbError::not_found("invite"));
            }
            conn.execute(
                "UPDATE invites SET redeemed_at = ?2 WHERE code = ?1",
                params![code, now.to_rfc3339()],
            )?;
        }
        self.get_couple(invite.couple_id)?
            .ok_or_else(|| DbError::not_found("couple"))
    }

    // ----- quests -----

    pub fn list_quests_by_couple(&self, couple_id: Uuid) -> DbResult<Vec<Quest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, couple_id, created_by, title, category, description, status, kind,
                    start_date, end_date, restrictions,
                    frequency, weekly_goal, streak, last_completed_date, completed_this_week,
                    created_at
             FROM quests WHERE couple_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![couple_id.to_string()], quest_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn get_quest(&self, id: Uuid) -> DbResult<Option<Quest>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, couple_id, created_by, title, category, description, status, kind,
                        start_date, end_date, restrictions,
                        frequency, weekly_goal, streak, last_completed_date, completed_this_week,
                        created_at
                 FROM quests WHERE id = ?1",
                params![id.to_string()],
                quest_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn create_quest(
        &self,
        couple_id: Uuid,
        created_by: Uuid,
        input: CreateQuestInput,
    ) -> DbResult<Quest> {
        let quest = Quest::new(couple_id, created_by, input);
        self.persist_quest(&quest, true)?;
        Ok(quest)
    }

    /// Writes a full quest row back and returns the canonical stored row.
    pub fn save_quest(&self, quest: &Quest) -> DbResult<Quest> {
        self.persist_quest(quest, false)?;
        self.get_quest(quest.id)?
            .ok_or_else(|| DbError::not_found("quest"))
    }

    fn persist_quest(&self, quest: &Quest, insert: bool) -> DbResult<()> {
        let (start_date, end_date, restrictions) = match &quest.kind {
            QuestKind::Challenge {
                start_date,
                end_date,
                restrictions,
            } => (
                start_date.map(|d| d.to_string()),
                end_date.map(|d| d.to_string()),
                restrictions.clone(),
            ),
            QuestKind::Routine { .. } => (None, None, None),
        };
        let (frequency, weekly_goal, streak, last_completed, week_json) = match &quest.kind {
            QuestKind::Routine {
                frequency,
                weekly_goal,
                progress,
            } => (
                Some(frequency.as_str()),
                Some(*weekly_goal as i64),
                progress.streak as i64,
                progress.last_completed_date.map(|d| d.to_string()),
                serde_json::to_string(&progress.completed_this_week)?,
            ),
            QuestKind::Challenge { .. } => (None, None, 0, None, "[]".to_string()),
        };

        let sql = if insert {
            "INSERT INTO quests (id, couple_id, created_by, title, category, description,
                                 status, kind, start_date, end_date, restrictions,
                                 frequency, weekly_goal, streak, last_completed_date,
                                 completed_this_week, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        } else {
            "UPDATE quests SET couple_id = ?2, created_by = ?3, title = ?4, category = ?5,
                               description = ?6, status = ?7, kind = ?8, start_date = ?9,
                               end_date = ?10, restrictions = ?11, frequency = ?12,
                               weekly_goal = ?13, streak = ?14, last_completed_date = ?15,
                               completed_this_week = ?16, created_at = ?17
             WHERE id = ?1"
        };
        let changed = self.conn().execute(
            sql,
            params![
                quest.id.to_string(),
                quest.couple_id.to_string(),
                quest.created_by.to_string(),
                quest.title,
                quest.category,
                quest.description,
                quest.status.as_str(),
                quest.kind.kind_str(),
                start_date,
                end_date,
                restrictions,
                frequency,
                weekly_goal,
                streak,
                last_completed,
                week_json,
                quest.created_at.to_rfc3339(),
            ],
        )?;
        if !insert && changed == 0 {
            return Err(DbError::not_found("quest"));
        }
        Ok(())
    }

    pub fn delete_quest(&self, id: Uuid) -> DbResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM quests WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    // ----- memories -----

    pub fn list_memories_by_couple(&self, couple_id: Uuid) -> DbResult<Vec<Memory>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, couple_id, created_by, title, description, memory_date,
                    photo_url, location, created_at
             FROM memories WHERE couple_id = ?1 ORDER BY memory_date DESC, created_at DESC",
        )?;
        let rows = stmt.query_map(params![couple_id.to_string()], memory_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn create_memory(
        &self,
        couple_id: Uuid,
        created_by: Uuid,
        input: CreateMemoryInput,
    ) -> DbResult<Memory> {
        let memory = Memory {
            id: Uuid::new_v4(),
            couple_id,
            created_by,
            title: input.title,
            description: input.description,
            memory_date: input.memory_date,
            photo_url: input.photo_url,
            location: input.location,
            created_at: Utc::now(),
        };
        self.conn().execute(
            "INSERT INTO memories (id, couple_id, created_by, title, description,
                                   memory_date, photo_url, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                memory.id.to_string(),
                memory.couple_id.to_string(),
                memory.created_by.to_string(),
                memory.title,
                memory.description,
                memory.memory_date.to_string(),
                memory.photo_url,
                memory.location,
                memory.created_at.to_rfc3339(),
            ],
        )?;
        Ok(memory)
    }

    pub fn update_memory(&self, id: Uuid, input: UpdateMemoryInput) -> DbResult<Memory> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE memories SET
                 title = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 memory_date = COALESCE(?4, memory_date),
                 photo_url = COALESCE(?5, photo_url),
                 location = COALESCE(?6, location)
             WHERE id = ?1",
            params![
                id.to_string(),
                input.title,
                input.description,
                input.memory_date.map(|d| d.to_string()),
                input.photo_url,
                input.location,
            ],
        )?;
        if changed == 0 {
            return Err(DbError::not_found("memory"));
        }
        conn.query_row(
            "SELECT id, couple_id, created_by, title, description, memory_date,
                    photo_url, location, created_at
             FROM memories WHERE id = ?1",
            params![id.to_string()],
            memory_from_row,
        )
        .map_err(Into::into)
    }

    pub fn delete_memory(&self, id: Uuid) -> DbResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM memories WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    // ----- activities -----

    pub fn list_activities_by_couple(&self, couple_id: Uuid) -> DbResult<Vec<Activity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, couple_id, created_by, title, category, date, notes, done, created_at
             FROM activities WHERE couple_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![couple_id.to_string()], activity_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn create_activity(
        &self,
        couple_id: Uuid,
        created_by: Uuid,
        input: CreateActivityInput,
    ) -> DbResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4(),
            couple_id,
            created_by,
            title: input.title,
            category: input.category,
            date: input.date,
            notes: input.notes,
            done: false,
            created_at: Utc::now(),
        };
        self.conn().execute(
            "INSERT INTO activities (id, couple_id, created_by, title, category,
                                     date, notes, done, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                activity.id.to_string(),
                activity.couple_id.to_string(),
                activity.created_by.to_string(),
                activity.title,
                activity.category,
                activity.date.map(|d| d.to_string()),
                activity.notes,
                activity.done,
                activity.created_at.to_rfc3339(),
            ],
        )?;
        Ok(activity)
    }

    pub fn update_activity(&self, id: Uuid, input: UpdateActivityInput) -> DbResult<Activity> {
        let conn = self.conn();
        // `date` distinguishes "leave as is" (absent) from "clear" (null),
        // so it cannot go through COALESCE.
        let changed = match input.date {
            Some(date) => conn.execute(
                "UPDATE activities SET
                     title = COALESCE(?2, title),
                     category = COALESCE(?3, category),
                     notes = COALESCE(?4, notes),
                     done = COALESCE(?5, done),
                     date = ?6
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    input.title,
                    input.category,
                    input.notes,
                    input.done,
                    date.map(|d| d.to_string()),
                ],
            )?,
            None => conn.execute(
                "UPDATE activities SET
                     title = COALESCE(?2, title),
                     category = COALESCE(?3, category),
                     notes = COALESCE(?4, notes),
                     done = COALESCE(?5, done)
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    input.title,
                    input.category,
                    input.notes,
                    input.done,
                ],
            )?,
        };
        if changed == 0 {
            return Err(DbError::not_found("activity"));
        }
        conn.query_row(
            "SELECT id, couple_id, created_by, title, category, date, notes, done, created_at
             FROM activities WHERE id = ?1",
            params![id.to_string()],
            activity_from_row,
        )
        .map_err(Into::into)
    }

    pub fn delete_activity(&self, id: Uuid) -> DbResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM activities WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    // ----- discoveries -----

    pub fn list_discoveries_by_couple(&self, couple_id: Uuid) -> DbResult<Vec<Discovery>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, couple_id, shared_by, url, title, description, image_url,
                    kind, reaction, created_at
             FROM discoveries WHERE couple_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![couple_id.to_string()], discovery_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn create_discovery(
        &self,
        couple_id: Uuid,
        shared_by: Uuid,
        input: CreateDiscoveryInput,
    ) -> DbResult<Discovery> {
        let discovery = Discovery {
            id: Uuid::new_v4(),
            couple_id,
            shared_by,
            url: input.url,
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            kind: input.kind.unwrap_or(DiscoveryKind::Other),
            reaction: None,
            created_at: Utc::now(),
        };
        self.conn().execute(
            "INSERT INTO discoveries (id, couple_id, shared_by, url, title, description,
                                      image_url, kind, reaction, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
            params![
                discovery.id.to_string(),
                discovery.couple_id.to_string(),
                discovery.shared_by.to_string(),
                discovery.url,
                discovery.title,
                discovery.description,
                discovery.image_url,
                discovery.kind.as_str(),
                discovery.created_at.to_rfc3339(),
            ],
        )?;
        Ok(discovery)
    }

    pub fn update_discovery(&self, id: Uuid, input: UpdateDiscoveryInput) -> DbResult<Discovery> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE discoveries SET
                 title = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 reaction = COALESCE(?4, reaction)
             WHERE id = ?1",
            params![id.to_string(), input.title, input.description, input.reaction],
        )?;
        if changed == 0 {
            return Err(DbError::not_found("discovery"));
        }
        conn.query_row(
            "SELECT id, couple_id, shared_by, url, title, description, image_url,
                    kind, reaction, created_at
             FROM discoveries WHERE id = ?1",
            params![id.to_string()],
            discovery_from_row,
        )
        .map_err(Into::into)
    }

    pub fn delete_discovery(&self, id: Uuid) -> DbResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM discoveries WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    // ----- daily connections -----

    pub fn list_connections_by_couple(&self, couple_id: Uuid) -> DbResult<Vec<DailyConnection>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, couple_id, day, question, answers, created_at
             FROM daily_connections WHERE couple_id = ?1 ORDER BY day DESC",
        )?;
        let rows = stmt.query_map(params![couple_id.to_string()], connection_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn get_connection(&self, id: Uuid) -> DbResult<Option<DailyConnection>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, couple_id, day, question, answers, created_at
                 FROM daily_connections WHERE id = ?1",
                params![id.to_string()],
                connection_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn get_connection_for_day(
        &self,
        couple_id: Uuid,
        day: NaiveDate,
    ) -> DbResult<Option<DailyConnection>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, couple_id, day, question, answers, created_at
                 FROM daily_connections WHERE couple_id = ?1 AND day = ?2",
                params![couple_id.to_string(), day.to_string()],
                connection_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn create_connection(
        &self,
        couple_id: Uuid,
        day: NaiveDate,
        question: String,
    ) -> DbResult<DailyConnection> {
        let connection = DailyConnection {
            id: Uuid::new_v4(),
            couple_id,
            day,
            question,
            answers: Vec::new(),
            created_at: Utc::now(),
        };
        self.conn().execute(
            "INSERT INTO daily_connections (id, couple_id, day, question, answers, created_at)
             VALUES (?1, ?2, ?3, ?4, '[]', ?5)",
            params![
                connection.id.to_string(),
                connection.couple_id.to_string(),
                connection.day.to_string(),
                connection.question,
                connection.created_at.to_rfc3339(),
            ],
        )?;
        Ok(connection)
    }

    pub fn save_connection_answers(&self, connection: &DailyConnection) -> DbResult<DailyConnection> {
        let answers = serde_json::to_string(&connection.answers)?;
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE daily_connections SET answers = ?2 WHERE id = ?1",
            params![connection.id.to_string(), answers],
        )?;
        if changed == 0 {
            return Err(DbError::not_found("daily connection"));
        }
        conn.query_row(
            "SELECT id, couple_id, day, question, answers, created_at
             FROM daily_connections WHERE id = ?1",
            params![connection.id.to_string()],
            connection_from_row,
        )
        .map_err(Into::into)
    }
}

// ----- row mapping -----

fn bad_column<E>(index: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn get_uuid(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(index)?;
    Uuid::parse_str(&raw).map_err(|e| bad_column(index, e))
}

fn get_opt_uuid(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| bad_column(index, e)))
        .transpose()
}

fn get_ts(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| bad_column(index, e))
}

fn get_day(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(index)?;
    raw.parse::<NaiveDate>().map_err(|e| bad_column(index, e))
}

fn get_opt_day(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| s.parse::<NaiveDate>().map_err(|e| bad_column(index, e)))
        .transpose()
}

fn couple_from_row(row: &Row<'_>) -> rusqlite::Result<Couple> {
    Ok(Couple {
        id: get_uuid(row, 0)?,
        partner_a: get_uuid(row, 1)?,
        partner_b: get_opt_uuid(row, 2)?,
        anniversary: get_opt_day(row, 3)?,
        created_at: get_ts(row, 4)?,
    })
}

fn invite_from_row(row: &Row<'_>) -> rusqlite::Result<Invite> {
    let redeemed: Option<String> = row.get(4)?;
    Ok(Invite {
        code: row.get(0)?,
        couple_id: get_uuid(row, 1)?,
        created_by: get_uuid(row, 2)?,
        created_at: get_ts(row, 3)?,
        redeemed_at: redeemed
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| bad_column(4, e))
            })
            .transpose()?,
    })
}

fn quest_from_row(row: &Row<'_>) -> rusqlite::Result<Quest> {
    let status_raw: String = row.get(6)?;
    let status = QuestStatus::from_str(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unknown quest status: {status_raw}").into(),
        )
    })?;
    let kind_raw: String = row.get(7)?;

    let kind = match kind_raw.as_str() {
        "challenge" => QuestKind::Challenge {
            start_date: get_opt_day(row, 8)?,
            end_date: get_opt_day(row, 9)?,
            restrictions: row.get(10)?,
        },
        "routine" => {
            let freq_raw: Option<String> = row.get(11)?;
            let frequency = freq_raw
                .as_deref()
                .and_then(Frequency::from_str)
                .unwrap_or(Frequency::Daily);
            let weekly_goal: Option<i64> = row.get(12)?;
            let streak: i64 = row.get(13)?;
            let week_json: String = row.get(15)?;
            let completed_this_week: BTreeSet<NaiveDate> =
                serde_json::from_str(&week_json).map_err(|e| bad_column(15, e))?;
            QuestKind::Routine {
                frequency,
                weekly_goal: weekly_goal.unwrap_or(3) as u8,
                progress: RoutineProgress {
                    streak: streak as u32,
                    last_completed_date: get_opt_day(row, 14)?,
                    completed_this_week,
                },
            }
        }
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                7,
                Type::Text,
                format!("unknown quest kind: {kind_raw}").into(),
            ))
        }
    };

    Ok(Quest {
        id: get_uuid(row, 0)?,
        couple_id: get_uuid(row, 1)?,
        created_by: get_uuid(row, 2)?,
        title: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        status,
        kind,
        created_at: get_ts(row, 16)?,
    })
}

fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    Ok(Memory {
        id: get_uuid(row, 0)?,
        couple_id: get_uuid(row, 1)?,
        created_by: get_uuid(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        memory_date: get_day(row, 5)?,
        photo_url: row.get(6)?,
        location: row.get(7)?,
        created_at: get_ts(row, 8)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: get_uuid(row, 0)?,
        couple_id: get_uuid(row, 1)?,
        created_by: get_uuid(row, 2)?,
        title: row.get(3)?,
        category: row.get(4)?,
        date: get_opt_day(row, 5)?,
        notes: row.get(6)?,
        done: row.get(7)?,
        created_at: get_ts(row, 8)?,
    })
}

fn discovery_from_row(row: &Row<'_>) -> rusqlite::Result<Discovery> {
    let kind_raw: String = row.get(7)?;
    Ok(Discovery {
        id: get_uuid(row, 0)?,
        couple_id: get_uuid(row, 1)?,
        shared_by: get_uuid(row, 2)?,
        url: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        image_url: row.get(6)?,
        kind: DiscoveryKind::from_str(&kind_raw).unwrap_or(DiscoveryKind::Other),
        reaction: row.get(8)?,
        created_at: get_ts(row, 9)?,
    })
}

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<DailyConnection> {
    let answers_json: String = row.get(4)?;
    Ok(DailyConnection {
        id: get_uuid(row, 0)?,
        couple_id: get_uuid(row, 1)?,
        day: get_day(row, 2)?,
        question: row.get(3)?,
        answers: serde_json::from_str(&answers_json).map_err(|e| bad_column(4, e))?,
        created_at: get_ts(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, NewQuestKind};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn seed_couple(db: &Database) -> (Couple, Uuid) {
        let user = Uuid::new_v4();
        let couple = db
            .create_couple(user, CreateCoupleInput { anniversary: None })
            .unwrap();
        (couple, user)
    }

    #[test]
    fn quest_round_trip_preserves_routine_progress() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);

        let quest = db
            .create_quest(
                couple.id,
                user,
                CreateQuestInput {
                    title: "Good-morning text".into(),
                    category: "communication".into(),
                    description: Some("before 9am".into()),
                    status: Some(QuestStatus::InProgress),
                    kind: NewQuestKind::Routine {
                        frequency: Frequency::Daily,
                        weekly_goal: None,
                    },
                },
            )
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let checked = quest.check_in(today).unwrap();
        let stored = db.save_quest(&checked).unwrap();

        match stored.kind {
            QuestKind::Routine { progress, .. } => {
                assert_eq!(progress.streak, 1);
                assert_eq!(progress.last_completed_date, Some(today));
                assert_eq!(progress.completed_this_week.len(), 1);
            }
            _ => panic!("expected routine"),
        }
    }

    #[test]
    fn quest_round_trip_preserves_challenge_dates() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);

        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let quest = db
            .create_quest(
                couple.id,
                user,
                CreateQuestInput {
                    title: "Letter a week".into(),
                    category: "romance".into(),
                    description: None,
                    status: None,
                    kind: NewQuestKind::Challenge {
                        start_date: Some(start),
                        end_date: Some(end),
                        restrictions: Some("handwritten only".into()),
                    },
                },
            )
            .unwrap();

        let listed = db.list_quests_by_couple(couple.id).unwrap();
        assert_eq!(listed.len(), 1);
        match &listed[0].kind {
            QuestKind::Challenge {
                start_date,
                end_date,
                restrictions,
            } => {
                assert_eq!(*start_date, Some(start));
                assert_eq!(*end_date, Some(end));
                assert_eq!(restrictions.as_deref(), Some("handwritten only"));
            }
            _ => panic!("expected challenge"),
        }
        assert_eq!(listed[0].status, QuestStatus::Available);
        assert_eq!(quest.id, listed[0].id);
    }

    #[test]
    fn delete_quest_reports_whether_a_row_went_away() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let quest = db
            .create_quest(
                couple.id,
                user,
                CreateQuestInput {
                    title: "Movie night".into(),
                    category: "fun".into(),
                    description: None,
                    status: None,
                    kind: NewQuestKind::Challenge {
                        start_date: None,
                        end_date: None,
                        restrictions: None,
                    },
                },
            )
            .unwrap();

        assert!(db.delete_quest(quest.id).unwrap());
        assert!(!db.delete_quest(quest.id).unwrap());
        assert!(db.list_quests_by_couple(couple.id).unwrap().is_empty());
    }

    #[test]
    fn invite_join_fills_partner_slot_once() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let invite = db.create_invite(couple.id, user).unwrap();

        let partner = Uuid::new_v4();
        let joined = db.join_by_code(&invite.code, partner).unwrap();
        assert_eq!(joined.partner_b, Some(partner));
        assert!(joined.is_connected());

        // Redeemed codes resolve to the "invalid invite" state.
        let again = db.join_by_code(&invite.code, Uuid::new_v4());
        assert!(matches!(again, Err(ref e) if e.is_not_found()));
    }

    #[test]
    fn second_invite_cannot_claim_a_filled_partner_slot() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let first = db.create_invite(couple.id, user).unwrap();
        let second = db.create_invite(couple.id, user).unwrap();

        db.join_by_code(&first.code, Uuid::new_v4()).unwrap();

        // The second code is still unredeemed, but the slot is taken.
        let late = db.join_by_code(&second.code, Uuid::new_v4());
        assert!(matches!(late, Err(ref e) if e.is_not_found()));

        // The losing code must not be burned by the failed attempt.
        let invite = db.get_invite(&second.code).unwrap().unwrap();
        assert!(invite.redeemed_at.is_none());
    }

    #[test]
    fn unknown_invite_code_is_not_found() {
        let db = test_db();
        let result = db.join_by_code("nosuchcode", Uuid::new_v4());
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[test]
    fn one_connection_per_couple_per_day() {
        let db = test_db();
        let (couple, _) = seed_couple(&db);
        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

        db.create_connection(couple.id, day, "What made you smile today?".into())
            .unwrap();
        let dup = db.create_connection(couple.id, day, "duplicate".into());
        assert!(dup.is_err());

        let found = db.get_connection_for_day(couple.id, day).unwrap().unwrap();
        assert_eq!(found.question, "What made you smile today?");
    }

    #[test]
    fn connection_answers_round_trip() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let connection = db
            .create_connection(couple.id, day, "Favorite shared meal?".into())
            .unwrap();

        let answered = connection.with_answer(user, "That ramen place".into());
        let stored = db.save_connection_answers(&answered).unwrap();
        assert_eq!(stored.answers.len(), 1);
        assert_eq!(stored.answer_for(user).unwrap().text, "That ramen place");
    }

    #[test]
    fn memory_update_touches_only_the_provided_fields() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let memory = db
            .create_memory(
                couple.id,
                user,
                CreateMemoryInput {
                    title: "First visit".into(),
                    description: Some("48 hours, zero sleep".into()),
                    memory_date: NaiveDate::from_ymd_opt(2023, 11, 18).unwrap(),
                    photo_url: None,
                    location: Some("Lisbon".into()),
                },
            )
            .unwrap();

        let updated = db
            .update_memory(
                memory.id,
                UpdateMemoryInput {
                    title: Some("First visit ever".into()),
                    description: None,
                    memory_date: None,
                    photo_url: Some("/uploads/abc-airport.jpg".into()),
                    location: None,
                },
            )
            .unwrap();
        assert_eq!(updated.title, "First visit ever");
        assert_eq!(updated.description.as_deref(), Some("48 hours, zero sleep"));
        assert_eq!(updated.memory_date, memory.memory_date);
        assert_eq!(updated.photo_url.as_deref(), Some("/uploads/abc-airport.jpg"));
        assert_eq!(updated.location.as_deref(), Some("Lisbon"));

        let listed = db.list_memories_by_couple(couple.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "First visit ever");
    }

    #[test]
    fn updating_a_missing_memory_is_not_found() {
        let db = test_db();
        let result = db.update_memory(
            Uuid::new_v4(),
            UpdateMemoryInput {
                title: Some("ghost".into()),
                description: None,
                memory_date: None,
                photo_url: None,
                location: None,
            },
        );
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[test]
    fn discovery_round_trip_preserves_kind_and_reaction() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let discovery = db
            .create_discovery(
                couple.id,
                user,
                CreateDiscoveryInput {
                    url: "https://example.com/song".into(),
                    title: "Our song, maybe".into(),
                    description: None,
                    image_url: None,
                    kind: Some(DiscoveryKind::Song),
                },
            )
            .unwrap();
        assert_eq!(discovery.kind, DiscoveryKind::Song);
        assert_eq!(discovery.reaction, None);

        let reacted = db
            .update_discovery(
                discovery.id,
                UpdateDiscoveryInput {
                    title: None,
                    description: None,
                    reaction: Some("❤️".into()),
                },
            )
            .unwrap();
        assert_eq!(reacted.kind, DiscoveryKind::Song);
        assert_eq!(reacted.reaction.as_deref(), Some("❤️"));
        assert_eq!(reacted.title, "Our song, maybe");

        let listed = db.list_discoveries_by_couple(couple.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, DiscoveryKind::Song);

        assert!(db.delete_discovery(discovery.id).unwrap());
        assert!(db.list_discoveries_by_couple(couple.id).unwrap().is_empty());
    }

    #[test]
    fn activity_date_can_be_cleared_back_to_idea_bin() {
        let db = test_db();
        let (couple, user) = seed_couple(&db);
        let activity = db
            .create_activity(
                couple.id,
                user,
                CreateActivityInput {
                    title: "Pottery class".into(),
                    category: "creative".into(),
                    date: Some(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
                    notes: None,
                },
            )
            .unwrap();

        let cleared = db
            .update_activity(
                activity.id,
                UpdateActivityInput {
                    title: None,
                    category: None,
                    date: Some(None),
                    notes: None,
                    done: None,
                },
            )
            .unwrap();
        assert_eq!(cleared.date, None);
    }
}
