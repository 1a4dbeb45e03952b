//! Evening broadcast of tomorrow's timetable to every user with a group.

use chrono::{Duration, Local};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::connection::DatabaseManager;
use crate::database::models::{timetable_entries, User};
use crate::utils::timetable::{day_header, render_day};

pub struct NotifierService {
    bot: Bot,
    db: DatabaseManager,
    cron: String,
    scheduler: JobScheduler,
}

impl NotifierService {
    pub async fn new(
        bot: Bot,
        db: DatabaseManager,
        cron: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            bot,
            db,
            cron: cron.to_string(),
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bot = self.bot.clone();
        let db = self.db.clone();

        let job = Job::new_async(self.cron.as_str(), move |_uuid, _l| {
            let bot = bot.clone();
            let db = db.clone();
            Box::pin(async move {
                if let Err(e) = send_tomorrow_timetables(bot, db).await {
                    tracing::error!("Timetable broadcast failed: {}", e);
                }
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        tracing::info!("Notifier started with schedule {}", self.cron);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Manual trigger, used by operators and tests.
    pub async fn broadcast_now(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        send_tomorrow_timetables(self.bot.clone(), self.db.clone()).await
    }
}

/// Sends each subscribed user their lessons for tomorrow. Users without
/// lessons are skipped; a failed delivery is logged and never blocks the
/// rest of the broadcast.
async fn send_tomorrow_timetables(
    bot: Bot,
    db: DatabaseManager,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let tomorrow = Local::now().date_naive() + Duration::days(1);
    let users = User::with_group(&db.pool).await?;
    let mut sent = 0usize;

    for user in users {
        let Some(group_id) = user.students_group_id else {
            continue;
        };
        let entries = match timetable_entries(&db.pool, user.tg_id, group_id, tomorrow).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Timetable query failed for user {}: {}", user.tg_id, e);
                continue;
            }
        };
        if entries.is_empty() {
            continue;
        }

        let text = format!(
            "Tomorrow's lessons, {}\n\n{}",
            day_header(tomorrow),
            render_day(&entries)
        );
        match bot
            .send_message(ChatId(user.tg_id), text)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                // Blocked bots and deleted accounts surface here.
                tracing::warn!("Broadcast to user {} failed: {}", user.tg_id, e);
            }
        }
    }

    tracing::info!("Broadcast for {} delivered to {} users", tomorrow, sent);
    Ok(())
}
