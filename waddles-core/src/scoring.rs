use waddles_types::{Attempt, LetterVerdict, Verdict};

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a guess against the secret word.
    ///
    /// Exact matches are found first, scanning from the last position so that
    /// removing a matched letter from the pool never shifts a position still to
    /// be visited. The remaining positions are then classified left to right
    /// against what is left of the pool, so a letter is never reported as
    /// `Contains` more often than it is still unaccounted for in the secret.
    ///
    /// The result has one verdict per character of `secret`. Positions the
    /// guess does not reach are `Absent` without a letter.
    pub fn score(secret: &str, guess: &str) -> Attempt {
        let guess_chars: Vec<char> = guess.chars().collect();
        let mut pool: Vec<char> = secret.chars().collect();
        let secret_chars = pool.clone();

        let mut verdicts = vec![LetterVerdict::new(Verdict::Unknown, None); secret_chars.len()];

        // First pass: exact positions, back to front
        for i in (0..secret_chars.len()).rev() {
            let guessed = guess_chars.get(i).copied();
            if guessed == Some(secret_chars[i]) {
                pool.remove(i);
                verdicts[i] = LetterVerdict::new(Verdict::Matches, guessed);
            } else {
                verdicts[i] = LetterVerdict::new(Verdict::Unknown, guessed);
            }
        }

        // Second pass: classify what is left against the reduced pool
        for verdict in verdicts.iter_mut() {
            if verdict.verdict != Verdict::Unknown {
                continue;
            }
            let Some(letter) = verdict.letter else {
                verdict.verdict = Verdict::Absent;
                continue;
            };
            match pool.iter().position(|&c| c == letter) {
                Some(index) => {
                    pool.remove(index);
                    verdict.verdict = Verdict::Contains;
                }
                None => verdict.verdict = Verdict::Absent,
            }
        }

        verdicts
    }

    /// Whether every position of the attempt is an exact match
    pub fn is_solved(attempt: &[LetterVerdict]) -> bool {
        !attempt.is_empty() && attempt.iter().all(LetterVerdict::is_match)
    }
}
