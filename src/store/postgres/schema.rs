//! Schema bootstrap.

/// Idempotent DDL for every table the store touches.
///
/// Safe to run on every start; existing objects are left alone. Executed
/// over the simple query protocol because it contains several statements.
pub const FORUM_SCHEMA: &str = r#"
CREATE EXTENSION IF NOT EXISTS ltree;

CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,
    karma       BIGINT NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS topics (
    id               BIGSERIAL PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    description      TEXT NOT NULL DEFAULT '',
    no_of_posts      BIGINT NOT NULL DEFAULT 0,
    no_of_followers  BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS posts (
    id                 BIGSERIAL PRIMARY KEY,
    topic_id           BIGINT NOT NULL REFERENCES topics (id),
    user_id            BIGINT NOT NULL REFERENCES users (id),
    title              TEXT NOT NULL,
    content            TEXT NOT NULL,
    summary            TEXT NOT NULL DEFAULT '',
    created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
    pinned_comment_id  BIGINT,
    score              BIGINT NOT NULL DEFAULT 0,
    no_of_comments     BIGINT NOT NULL DEFAULT 0,
    is_deleted         BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at         TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS comments (
    id                BIGSERIAL PRIMARY KEY,
    post_id           BIGINT NOT NULL REFERENCES posts (id),
    parent_id         BIGINT REFERENCES comments (id),
    path              LTREE,
    content           TEXT NOT NULL,
    summary           TEXT NOT NULL DEFAULT '',
    has_long_content  BOOLEAN NOT NULL DEFAULT FALSE,
    user_id           BIGINT NOT NULL REFERENCES users (id),
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    score             BIGINT NOT NULL DEFAULT 0,
    no_of_replies     BIGINT NOT NULL DEFAULT 0,
    is_deleted        BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at        TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS comments_path_gist ON comments USING GIST (path);
CREATE INDEX IF NOT EXISTS comments_post_id_idx ON comments (post_id);
CREATE INDEX IF NOT EXISTS comments_parent_id_idx ON comments (parent_id);
CREATE INDEX IF NOT EXISTS posts_topic_id_idx ON posts (topic_id);

DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'posts_pinned_comment_id_fkey'
    ) THEN
        ALTER TABLE posts
            ADD CONSTRAINT posts_pinned_comment_id_fkey
            FOREIGN KEY (pinned_comment_id) REFERENCES comments (id);
    END IF;
END
$$;

CREATE TABLE IF NOT EXISTS post_votes (
    user_id     BIGINT NOT NULL REFERENCES users (id),
    post_id     BIGINT NOT NULL REFERENCES posts (id),
    vote_value  SMALLINT NOT NULL CHECK (vote_value BETWEEN -1 AND 1),
    PRIMARY KEY (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS comment_votes (
    user_id     BIGINT NOT NULL REFERENCES users (id),
    comment_id  BIGINT NOT NULL REFERENCES comments (id),
    vote_value  SMALLINT NOT NULL CHECK (vote_value BETWEEN -1 AND 1),
    PRIMARY KEY (user_id, comment_id)
);

CREATE TABLE IF NOT EXISTS user_topics (
    user_id   BIGINT NOT NULL REFERENCES users (id),
    topic_id  BIGINT NOT NULL REFERENCES topics (id),
    PRIMARY KEY (user_id, topic_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_every_table() {
        for table in [
            "users",
            "topics",
            "posts",
            "comments",
            "post_votes",
            "comment_votes",
            "user_topics",
        ] {
            assert!(
                FORUM_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing table {table}"
            );
        }
        assert!(FORUM_SCHEMA.contains("USING GIST (path)"));
    }
}
