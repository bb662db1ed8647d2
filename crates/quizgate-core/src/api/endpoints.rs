//! Paths of the quiz API, relative to the configured base address.

pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";

pub const SCORES: &str = "/users/scores";
pub const USER_PROFILE: &str = "/profile";

pub const SUBJECTS: &str = "/subjects";

pub const USERS: &str = "/users";
pub const ADMIN_STATS: &str = "/admin/statistics";

pub fn subject(id: i64) -> String {
    format!("/subjects/{}", id)
}

pub fn chapters(subject_id: i64) -> String {
    format!("/subjects/{}/chapters", subject_id)
}

pub fn chapter(id: i64) -> String {
    format!("/chapters/{}", id)
}

pub fn quizzes(chapter_id: i64) -> String {
    format!("/chapters/{}/quizzes", chapter_id)
}

pub fn quiz(id: i64) -> String {
    format!("/quizzes/{}", id)
}

pub fn questions(quiz_id: i64) -> String {
    format!("/quizzes/{}/questions", quiz_id)
}

pub fn question(id: i64) -> String {
    format!("/questions/{}", id)
}

pub fn quiz_attempt(quiz_id: i64) -> String {
    format!("/quizzes/{}/attempt", quiz_id)
}

pub fn user(id: i64) -> String {
    format!("/users/{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_paths() {
        assert_eq!(chapters(10001), "/subjects/10001/chapters");
        assert_eq!(quizzes(20003), "/chapters/20003/quizzes");
        assert_eq!(questions(30010), "/quizzes/30010/questions");
        assert_eq!(quiz_attempt(30010), "/quizzes/30010/attempt");
    }
}
