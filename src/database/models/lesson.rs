use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A recurring lesson of a students group. A lesson split by subgroup is
/// stored as several rows sharing name and format, one per `subgroup` tag.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    /// Primary key.
    pub id: i64,
    /// Subject name.
    pub name: String,
    /// Owning group.
    pub students_group_id: i64,
    /// Subgroup tag ("1", "2", ...) or `None` for an unsplit lesson.
    pub subgroup: Option<String>,
    /// 0 lecture, 1 seminar, 2 practical, 3 lab, 4 other.
    pub lesson_format: i64,
    /// Online meeting link, settable through a moderated request.
    pub link: Option<String>,
}

/// A teacher; linked to lessons through `lessons_teachers`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Teacher {
    /// Primary key.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Middle (patronymic) name.
    pub middle_name: String,
}

/// One dated occurrence of a lesson.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SingleLesson {
    /// Primary key.
    pub id: i64,
    /// Calendar date.
    pub date: NaiveDate,
    /// Start time.
    pub starts_at: NaiveTime,
    /// End time.
    pub ends_at: NaiveTime,
    /// The recurring lesson this occurrence belongs to.
    pub lesson_id: i64,
    /// Optional free-text note.
    pub comment: Option<String>,
}

/// A timetable row assembled for rendering: the occurrence, its lesson and
/// the lesson's teachers.
#[derive(Debug, Clone)]
pub struct TimetableEntry {
    /// Dated occurrence.
    pub occurrence: SingleLesson,
    /// The lesson itself.
    pub lesson: Lesson,
    /// Teachers of the lesson, ordered by id.
    pub teachers: Vec<Teacher>,
}

impl Lesson {
    /// Display label for `lesson_format`.
    pub fn format_label(&self) -> &'static str {
        match self.lesson_format {
            0 => "lecture",
            1 => "seminar",
            2 => "practical",
            3 => "lab",
            _ => "other",
        }
    }

    /// Human title: subject name, annotated with format and teachers when
    /// the lesson is split into subgroups.
    pub fn title(&self, teachers: &[Teacher]) -> String {
        match self.subgroup {
            Some(_) => {
                let names: Vec<String> = teachers.iter().map(Teacher::short_name).collect();
                format!("{} ({}, {})", self.name, self.format_label(), names.join(", "))
            }
            None => self.name.clone(),
        }
    }

    /// Inserts a lesson. Exercised by the importer contract and tests.
    pub async fn create(
        pool: &sqlx::SqlitePool,
        name: &str,
        students_group_id: i64,
        subgroup: Option<&str>,
        lesson_format: i64,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO lessons (name, students_group_id, subgroup, lesson_format) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(students_group_id)
        .bind(subgroup)
        .bind(lesson_format)
        .execute(pool)
        .await?;
        let id = result.last_insert_rowid();
        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Looks a lesson up by id.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT id, name, students_group_id, subgroup, lesson_format, link
             FROM lessons WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The lesson, but only if `user` can see it: it belongs to the user's
    /// group and is either unsplit or one of the user's subgroups.
    pub async fn find_visible_to_user(
        pool: &sqlx::SqlitePool,
        id: i64,
        user_id: i64,
        students_group_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT id, name, students_group_id, subgroup, lesson_format, link
             FROM lessons
             WHERE id = ?
               AND students_group_id = ?
               AND (subgroup IS NULL
                    OR id IN (SELECT lesson_id FROM lessons_subgroups_members WHERE user_id = ?))",
        )
        .bind(id)
        .bind(students_group_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The variant row matching one subgroup pick.
    pub async fn find_variant(
        pool: &sqlx::SqlitePool,
        students_group_id: i64,
        name: &str,
        lesson_format: i64,
        subgroup: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT id, name, students_group_id, subgroup, lesson_format, link
             FROM lessons
             WHERE students_group_id = ? AND name = ? AND lesson_format = ? AND subgroup = ?",
        )
        .bind(students_group_id)
        .bind(name)
        .bind(lesson_format)
        .bind(subgroup)
        .fetch_optional(pool)
        .await
    }

    /// All subgroup variants of one name+format, ordered by subgroup tag.
    pub async fn subgroup_variants(
        pool: &sqlx::SqlitePool,
        students_group_id: i64,
        name: &str,
        lesson_format: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT id, name, students_group_id, subgroup, lesson_format, link
             FROM lessons
             WHERE students_group_id = ? AND name = ? AND lesson_format = ?
             ORDER BY subgroup",
        )
        .bind(students_group_id)
        .bind(name)
        .bind(lesson_format)
        .fetch_all(pool)
        .await
    }

    /// (name, lesson_format) pairs with more than one subgroup variant in
    /// the group, ascending by name. The caller excludes pairs already
    /// answered in this conversation; the set is recomputed fresh per step.
    pub async fn ambiguous_pairs(
        pool: &sqlx::SqlitePool,
        students_group_id: i64,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT name, lesson_format
             FROM lessons
             WHERE students_group_id = ?
             GROUP BY name, students_group_id, lesson_format
             HAVING COUNT(1) > 1
             ORDER BY name",
        )
        .bind(students_group_id)
        .fetch_all(pool)
        .await
    }

    /// Sets the online link; the only lesson field the bot ever mutates.
    pub async fn set_link(
        pool: &sqlx::SqlitePool,
        id: i64,
        link: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE lessons SET link = ? WHERE id = ?")
            .bind(link)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Attaches a teacher. Exercised by the importer contract and tests.
    pub async fn add_teacher(
        pool: &sqlx::SqlitePool,
        lesson_id: i64,
        teacher_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO lessons_teachers (lesson_id, teacher_id) VALUES (?, ?)")
            .bind(lesson_id)
            .bind(teacher_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

impl Teacher {
    /// "Last F. M." style short name; falls back to the bare last name.
    pub fn short_name(&self) -> String {
        match (self.first_name.chars().next(), self.middle_name.chars().next()) {
            (Some(f), Some(m)) => format!("{} {}. {}.", self.last_name, f, m),
            _ => self.last_name.clone(),
        }
    }

    /// Inserts a teacher. Exercised by the importer contract and tests.
    pub async fn create(
        pool: &sqlx::SqlitePool,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO teachers (first_name, last_name, middle_name) VALUES (?, ?, ?)",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(middle_name)
        .execute(pool)
        .await?;
        let id = result.last_insert_rowid();
        sqlx::query_as::<_, Teacher>(
            "SELECT id, first_name, last_name, middle_name FROM teachers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
    }

    /// Teachers of one lesson, ordered by id.
    pub async fn for_lesson(
        pool: &sqlx::SqlitePool,
        lesson_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>(
            "SELECT t.id, t.first_name, t.last_name, t.middle_name
             FROM teachers t
             JOIN lessons_teachers lt ON lt.teacher_id = t.id
             WHERE lt.lesson_id = ?
             ORDER BY t.id",
        )
        .bind(lesson_id)
        .fetch_all(pool)
        .await
    }
}

impl SingleLesson {
    /// Inserts an occurrence. Exercised by the importer contract and tests.
    pub async fn create(
        pool: &sqlx::SqlitePool,
        lesson_id: i64,
        date: NaiveDate,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO single_lessons (date, starts_at, ends_at, lesson_id) VALUES (?, ?, ?, ?)",
        )
        .bind(date)
        .bind(starts_at)
        .bind(ends_at)
        .bind(lesson_id)
        .execute(pool)
        .await?;
        let id = result.last_insert_rowid();
        sqlx::query_as::<_, SingleLesson>(
            "SELECT id, date, starts_at, ends_at, lesson_id, comment FROM single_lessons WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
    }

    /// The user's occurrences on `date`: lessons of their group that are
    /// unsplit or among their subgroup memberships, ordered by start time.
    pub async fn for_user_on_date(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        students_group_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SingleLesson>(
            "SELECT sl.id, sl.date, sl.starts_at, sl.ends_at, sl.lesson_id, sl.comment
             FROM single_lessons sl
             JOIN lessons l ON l.id = sl.lesson_id
              AND l.students_group_id = ?
              AND (l.subgroup IS NULL
                   OR l.id IN (SELECT lesson_id FROM lessons_subgroups_members WHERE user_id = ?))
             WHERE sl.date = ?
             ORDER BY sl.starts_at",
        )
        .bind(students_group_id)
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await
    }
}

/// Assembles render-ready timetable rows for one user and date.
pub async fn timetable_entries(
    pool: &sqlx::SqlitePool,
    user_id: i64,
    students_group_id: i64,
    date: NaiveDate,
) -> Result<Vec<TimetableEntry>, sqlx::Error> {
    let occurrences = SingleLesson::for_user_on_date(pool, user_id, students_group_id, date).await?;
    let mut entries = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let lesson = Lesson::find_by_id(pool, occurrence.lesson_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let teachers = Teacher::for_lesson(pool, lesson.id).await?;
        entries.push(TimetableEntry {
            occurrence,
            lesson,
            teachers,
        });
    }
    Ok(entries)
}
