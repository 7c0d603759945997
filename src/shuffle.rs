// Exam variant generation: question and answer permutation

use crate::question::{Exam, ExamQuestion, Question};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Number of questions each exam receives.
///
/// `None`, zero, or anything above the bank size means "all of them".
pub fn questions_per_exam(requested: Option<usize>, available: usize) -> usize {
    match requested {
        Some(m) if m >= 1 && m <= available => m,
        _ => available,
    }
}

/// Draws exam variants from a single PRNG so a seeded run is reproducible
pub struct ExamShuffler {
    rng: StdRng,
}

impl ExamShuffler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        ExamShuffler { rng }
    }

    /// Generate exams `1..=count` in sequence
    pub fn generate_all(&mut self, bank: &[Question], count: usize, per_exam: usize) -> Vec<Exam> {
        (1..=count)
            .map(|number| self.generate(number, bank, per_exam))
            .collect()
    }

    /// Generate one exam variant.
    ///
    /// Shuffles a copy of the bank, keeps the first `per_exam` questions, then
    /// shuffles each question's answers and records where the correct ones
    /// landed.
    pub fn generate(&mut self, number: usize, bank: &[Question], per_exam: usize) -> Exam {
        let mut order: Vec<&Question> = bank.iter().collect();
        order.shuffle(&mut self.rng);
        order.truncate(per_exam);

        let questions = order
            .into_iter()
            .enumerate()
            .map(|(j, q)| self.place_question(j + 1, q))
            .collect();

        Exam { number, questions }
    }

    fn place_question(&mut self, idx: usize, question: &Question) -> ExamQuestion {
        let mut answers: Vec<_> = question.answers().cloned().collect();
        answers.shuffle(&mut self.rng);

        let correct_indices: Vec<usize> = answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.correct)
            .map(|(k, _)| k + 1)
            .collect();

        for &k in &correct_indices {
            tracing::info!("question {}: correct: index {}, \"{}\"", idx, k, answers[k - 1].text);
        }
        if correct_indices.is_empty() {
            tracing::warn!("question {} has no correct answer: \"{}\"", idx, question.text);
        }

        ExamQuestion {
            idx,
            text: question.text.clone(),
            correct_index: correct_indices.last().copied(),
            correct_indices,
            answers,
        }
    }
}
