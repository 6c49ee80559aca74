//! Arithmetic quiz gate
//!
//! Before every run the player answers small sums until they get
//! `required_streak` right in a row. Each question shows four options; the
//! correct one never sits in the same slot as the previous question's.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::timer::Deadline;

/// Why an option set was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionSetError {
    #[error("expected 4 options, got {0}")]
    WrongCount(usize),
    #[error("option {0} appears more than once")]
    Duplicate(u32),
    #[error("option {0} is outside 0..=20")]
    OutOfRange(u32),
    #[error("answer {0} is not among the options")]
    MissingAnswer(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
}

/// A two-operand question. Subtraction is always larger minus smaller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub left: u32,
    pub right: u32,
    pub op: Operation,
    pub answer: u32,
}

impl Question {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let a = rng.random_range(OPERAND_MIN..=OPERAND_MAX);
        let b = rng.random_range(OPERAND_MIN..=OPERAND_MAX);
        if rng.random_bool(0.5) {
            Self {
                left: a,
                right: b,
                op: Operation::Add,
                answer: a + b,
            }
        } else {
            let (hi, lo) = (a.max(b), a.min(b));
            Self {
                left: hi,
                right: lo,
                op: Operation::Subtract,
                answer: hi - lo,
            }
        }
    }

    pub fn text(&self) -> String {
        let sym = match self.op {
            Operation::Add => '+',
            Operation::Subtract => '-',
        };
        format!("{} {} {} = ?", self.left, sym, self.right)
    }
}

/// Four options with the index of the correct one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub options: [u32; OPTION_COUNT],
    pub correct_slot: usize,
}

/// Candidate distractors: everything within the spread of `answer`, in
/// range, except the answer itself
pub fn distractor_pool(answer: u32) -> Vec<u32> {
    let lo = answer.saturating_sub(DISTRACTOR_SPREAD);
    let hi = (answer + DISTRACTOR_SPREAD).min(OPTION_MAX);
    (lo..=hi).filter(|&v| v != answer).collect()
}

/// Pick a slot for the correct answer, never `previous`
pub fn choose_slot<R: Rng>(previous: Option<usize>, rng: &mut R) -> usize {
    let slots: Vec<usize> = (0..OPTION_COUNT).filter(|&s| Some(s) != previous).collect();
    slots[rng.random_range(0..slots.len())]
}

/// Check the option-set invariant: four distinct in-range values including the answer
pub fn validate_options(options: &[u32], answer: u32) -> Result<(), OptionSetError> {
    if options.len() != OPTION_COUNT {
        return Err(OptionSetError::WrongCount(options.len()));
    }
    for (i, &v) in options.iter().enumerate() {
        if v > OPTION_MAX {
            return Err(OptionSetError::OutOfRange(v));
        }
        if options[..i].contains(&v) {
            return Err(OptionSetError::Duplicate(v));
        }
    }
    if !options.contains(&answer) {
        return Err(OptionSetError::MissingAnswer(answer));
    }
    Ok(())
}

fn place(answer: u32, distractors: &[u32], slot: usize) -> Vec<u32> {
    let mut options = distractors.to_vec();
    options.insert(slot.min(options.len()), answer);
    options
}

fn into_set(options: Vec<u32>, slot: usize) -> Option<OptionSet> {
    let options: [u32; OPTION_COUNT] = options.try_into().ok()?;
    Some(OptionSet {
        options,
        correct_slot: slot,
    })
}

/// Random construction: draw distractors from the pool, topping up with
/// random offsets if the pool runs dry
pub fn try_generate_options<R: Rng>(
    answer: u32,
    previous_slot: Option<usize>,
    rng: &mut R,
) -> Result<OptionSet, OptionSetError> {
    let needed = OPTION_COUNT - 1;
    let mut pool = distractor_pool(answer);
    pool.shuffle(rng);
    let mut distractors: Vec<u32> = pool.into_iter().take(needed).collect();

    let mut attempts = 0;
    while distractors.len() < needed && attempts < 64 {
        attempts += 1;
        let offset = rng.random_range(1..=DISTRACTOR_SPREAD);
        let candidate = if rng.random_bool(0.5) {
            answer.checked_sub(offset)
        } else {
            Some(answer + offset)
        };
        if let Some(v) = candidate {
            if v <= OPTION_MAX && v != answer && !distractors.contains(&v) {
                distractors.push(v);
            }
        }
    }

    let slot = choose_slot(previous_slot, rng);
    let options = place(answer, &distractors, slot);
    validate_options(&options, answer)?;
    into_set(options, slot).ok_or(OptionSetError::WrongCount(OPTION_COUNT))
}

/// Deterministic construction from nearest neighbours (`answer ± 1`,
/// `answer ± 2`, ...) clamped to range. Honours the same slot rule.
pub fn fallback_options<R: Rng>(answer: u32, previous_slot: Option<usize>, rng: &mut R) -> OptionSet {
    let answer = answer.min(OPTION_MAX);
    let needed = OPTION_COUNT - 1;
    let mut distractors = Vec::with_capacity(needed);
    let mut offset = 1;
    while distractors.len() < needed && offset <= OPTION_MAX {
        for v in [answer.checked_sub(offset), Some(answer + offset)].into_iter().flatten() {
            if v <= OPTION_MAX && distractors.len() < needed && !distractors.contains(&v) {
                distractors.push(v);
            }
        }
        offset += 1;
    }
    let slot = choose_slot(previous_slot, rng);
    let options = place(answer, &distractors, slot);
    // OPTION_MAX >= OPTION_COUNT, so the neighbour walk always finds enough values
    let options: [u32; OPTION_COUNT] = options.try_into().unwrap_or([answer, 0, 0, 0]);
    OptionSet {
        options,
        correct_slot: slot,
    }
}

/// Option set for `answer`, recovering locally if the random construction
/// ever violates the invariant
pub fn generate_options<R: Rng>(answer: u32, previous_slot: Option<usize>, rng: &mut R) -> OptionSet {
    match try_generate_options(answer, previous_slot, rng) {
        Ok(set) => set,
        Err(e) => {
            log::warn!("Option set rejected ({}), using fallback", e);
            fallback_options(answer, previous_slot, rng)
        }
    }
}

/// Result of submitting an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// A previous answer is still being shown; submission dropped
    Ignored,
    Correct { streak: u8 },
    Wrong,
}

/// What happened when a feedback delay elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProgress {
    /// Streak reached; the gate is open
    Unlocked,
    /// A fresh question is up
    NextQuestion,
}

/// An answer on screen, waiting out its feedback delay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFeedback {
    pub correct: bool,
    pub selected: u32,
    pub due: Deadline,
}

/// One quiz gate from entry to unlock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
    pub question: Question,
    pub options: OptionSet,
    pub streak: u8,
    pub required_streak: u8,
    feedback_ms: f64,
    /// Set while a result is displayed; doubles as the processing lock
    pending: Option<PendingFeedback>,
    unlocked: bool,
}

impl QuizSession {
    /// Start a gate. `previous_slot` is where the last question shown (in
    /// any gate) had its answer.
    pub fn new<R: Rng>(
        rng: &mut R,
        previous_slot: Option<usize>,
        required_streak: u8,
        feedback_ms: f64,
    ) -> Self {
        let question = Question::generate(rng);
        let options = generate_options(question.answer, previous_slot, rng);
        Self {
            question,
            options,
            streak: 0,
            required_streak: required_streak.max(1),
            feedback_ms,
            pending: None,
            unlocked: false,
        }
    }

    /// True while answer controls must be disabled
    pub fn is_locked(&self) -> bool {
        self.pending.is_some() || self.unlocked
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn pending(&self) -> Option<&PendingFeedback> {
        self.pending.as_ref()
    }

    /// Slot of the correct answer for the question on screen
    pub fn correct_slot(&self) -> usize {
        self.options.correct_slot
    }

    /// Submit `selected` as the answer to the current question
    pub fn check_answer(&mut self, selected: u32, now_ms: f64) -> AnswerOutcome {
        if self.is_locked() {
            return AnswerOutcome::Ignored;
        }
        let correct = selected == self.question.answer;
        self.pending = Some(PendingFeedback {
            correct,
            selected,
            due: Deadline::after(now_ms, self.feedback_ms),
        });
        if correct {
            self.streak = self.streak.saturating_add(1);
            log::debug!("Quiz: {} correct (streak {})", self.question.text(), self.streak);
            AnswerOutcome::Correct {
                streak: self.streak,
            }
        } else {
            self.streak = 0;
            log::debug!("Quiz: {} answered {} (wrong)", self.question.text(), selected);
            AnswerOutcome::Wrong
        }
    }

    /// Resolve a pending answer once its feedback delay has elapsed
    pub fn poll<R: Rng>(&mut self, now_ms: f64, rng: &mut R) -> Option<QuizProgress> {
        let pending = self.pending.as_ref()?;
        if !pending.due.is_due(now_ms) {
            return None;
        }
        let correct = pending.correct;
        self.pending = None;

        if correct && self.streak >= self.required_streak {
            self.streak = 0;
            self.unlocked = true;
            return Some(QuizProgress::Unlocked);
        }
        self.next_question(rng);
        Some(QuizProgress::NextQuestion)
    }

    fn next_question<R: Rng>(&mut self, rng: &mut R) {
        self.question = Question::generate(rng);
        self.options = generate_options(self.question.answer, Some(self.options.correct_slot), rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn test_questions_stay_in_range() {
        let mut r = rng(1);
        for _ in 0..500 {
            let q = Question::generate(&mut r);
            assert!((OPERAND_MIN..=OPERAND_MAX).contains(&q.left));
            assert!((OPERAND_MIN..=OPERAND_MAX).contains(&q.right));
            match q.op {
                Operation::Add => assert_eq!(q.answer, q.left + q.right),
                Operation::Subtract => {
                    assert!(q.left >= q.right);
                    assert_eq!(q.answer, q.left - q.right);
                }
            }
            assert!(q.answer <= OPTION_MAX);
        }
    }

    #[test]
    fn test_question_text() {
        let q = Question {
            left: 9,
            right: 4,
            op: Operation::Subtract,
            answer: 5,
        };
        assert_eq!(q.text(), "9 - 4 = ?");
    }

    #[test]
    fn test_pool_for_seven() {
        let pool = distractor_pool(7);
        assert_eq!(pool, vec![2, 3, 4, 5, 6, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_pool_clamps_at_edges() {
        assert_eq!(distractor_pool(0), vec![1, 2, 3, 4, 5]);
        assert_eq!(distractor_pool(20), vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn test_options_for_seven_come_from_pool() {
        let mut r = rng(3);
        for _ in 0..100 {
            let set = generate_options(7, None, &mut r);
            assert_eq!(set.options[set.correct_slot], 7);
            for (i, v) in set.options.iter().enumerate() {
                if i != set.correct_slot {
                    assert!((2..=12).contains(v) && *v != 7);
                }
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_sets() {
        assert_eq!(validate_options(&[1, 2, 3], 1), Err(OptionSetError::WrongCount(3)));
        assert_eq!(validate_options(&[1, 2, 2, 3], 1), Err(OptionSetError::Duplicate(2)));
        assert_eq!(validate_options(&[1, 2, 21, 3], 1), Err(OptionSetError::OutOfRange(21)));
        assert_eq!(validate_options(&[1, 2, 4, 3], 7), Err(OptionSetError::MissingAnswer(7)));
        assert!(validate_options(&[1, 2, 4, 3], 4).is_ok());
    }

    #[test]
    fn test_fallback_is_valid_at_edges() {
        let mut r = rng(5);
        for answer in [0, 1, 7, 19, 20] {
            let set = fallback_options(answer, Some(2), &mut r);
            assert!(validate_options(&set.options, answer).is_ok());
            assert_eq!(set.options[set.correct_slot], answer);
            assert_ne!(set.correct_slot, 2);
        }
        let set = fallback_options(7, Some(0), &mut r);
        let mut distractors: Vec<u32> = set
            .options
            .iter()
            .copied()
            .filter(|&v| v != 7)
            .collect();
        distractors.sort();
        assert_eq!(distractors, vec![5, 6, 8]);
    }

    #[test]
    fn test_choose_slot_avoids_previous() {
        let mut r = rng(9);
        for prev in 0..OPTION_COUNT {
            for _ in 0..50 {
                assert_ne!(choose_slot(Some(prev), &mut r), prev);
            }
        }
        for _ in 0..50 {
            assert!(choose_slot(None, &mut r) < OPTION_COUNT);
        }
    }

    fn answer_correctly(quiz: &mut QuizSession, now: f64) -> AnswerOutcome {
        let answer = quiz.question.answer;
        quiz.check_answer(answer, now)
    }

    fn wrong_answer(quiz: &QuizSession) -> u32 {
        quiz.options.options[(quiz.correct_slot() + 1) % OPTION_COUNT]
    }

    #[test]
    fn test_two_correct_unlocks() {
        let mut r = rng(11);
        let mut quiz = QuizSession::new(&mut r, None, 2, 1000.0);

        assert_eq!(answer_correctly(&mut quiz, 0.0), AnswerOutcome::Correct { streak: 1 });
        assert_eq!(quiz.poll(500.0, &mut r), None);
        assert_eq!(quiz.poll(1000.0, &mut r), Some(QuizProgress::NextQuestion));

        assert_eq!(answer_correctly(&mut quiz, 1100.0), AnswerOutcome::Correct { streak: 2 });
        assert!(!quiz.is_unlocked());
        assert_eq!(quiz.poll(2100.0, &mut r), Some(QuizProgress::Unlocked));
        assert!(quiz.is_unlocked());
        assert_eq!(quiz.streak, 0);
    }

    #[test]
    fn test_correct_then_wrong_resets() {
        let mut r = rng(12);
        let mut quiz = QuizSession::new(&mut r, None, 2, 1000.0);

        answer_correctly(&mut quiz, 0.0);
        quiz.poll(1000.0, &mut r);
        let wrong = wrong_answer(&quiz);
        assert_eq!(quiz.check_answer(wrong, 1000.0), AnswerOutcome::Wrong);
        assert_eq!(quiz.streak, 0);
        assert_eq!(quiz.poll(2000.0, &mut r), Some(QuizProgress::NextQuestion));
        assert!(!quiz.is_unlocked());
        assert!(!quiz.is_locked());
    }

    #[test]
    fn test_double_submit_is_ignored() {
        let mut r = rng(13);
        let mut quiz = QuizSession::new(&mut r, None, 2, 1000.0);
        answer_correctly(&mut quiz, 0.0);
        assert!(quiz.is_locked());
        assert_eq!(answer_correctly(&mut quiz, 10.0), AnswerOutcome::Ignored);
        assert_eq!(quiz.streak, 1);
    }

    proptest! {
        #[test]
        fn option_sets_are_valid(seed in any::<u64>(), answer in 0u32..=OPTION_MAX, prev in proptest::option::of(0usize..OPTION_COUNT)) {
            let mut r = rng(seed);
            let set = generate_options(answer, prev, &mut r);
            prop_assert!(validate_options(&set.options, answer).is_ok());
            prop_assert_eq!(set.options[set.correct_slot], answer);
            if let Some(p) = prev {
                prop_assert_ne!(set.correct_slot, p);
            }
        }

        #[test]
        fn consecutive_slots_never_repeat(seed in any::<u64>(), answers in proptest::collection::vec(any::<bool>(), 1..40)) {
            let mut r = rng(seed);
            let mut quiz = QuizSession::new(&mut r, None, 2, 10.0);
            let mut now = 0.0;
            let mut last = quiz.correct_slot();
            for right in answers {
                let value = if right { quiz.question.answer } else { wrong_answer(&quiz) };
                quiz.check_answer(value, now);
                now += 10.0;
                match quiz.poll(now, &mut r) {
                    Some(QuizProgress::Unlocked) => break,
                    Some(QuizProgress::NextQuestion) => {
                        prop_assert_ne!(quiz.correct_slot(), last);
                        last = quiz.correct_slot();
                    }
                    None => prop_assert!(false, "feedback should be due"),
                }
            }
        }
    }
}
