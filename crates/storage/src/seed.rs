//! Built-in semiconductor question bank.

use quiz_core::model::{Difficulty, OptionDraft, Question, QuestionDraft, QuestionId};

/// Topics offered for topic-wise quizzes, in display order.
///
/// A topic may currently have no questions; callers show it with a zero count.
pub const KNOWN_TOPICS: [&str; 6] = [
    "MOSFET",
    "CMOS Logic",
    "Doping",
    "P-N Junction",
    "Memory Devices",
    "Fabrication",
];

fn draft(
    id: u64,
    category: &str,
    difficulty: Difficulty,
    prompt: &str,
    options: [OptionDraft; 4],
    explanation: &str,
) -> QuestionDraft {
    QuestionDraft {
        id: QuestionId::new(id),
        prompt: prompt.into(),
        options: options.into(),
        explanation: explanation.into(),
        category: category.into(),
        difficulty,
    }
}

/// Unvalidated drafts of the built-in bank.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn builtin_drafts() -> Vec<QuestionDraft> {
    vec![
        draft(
            1,
            "MOSFET",
            Difficulty::Easy,
            "What does MOSFET stand for?",
            [
                OptionDraft::correct("a", "Metal-Oxide-Semiconductor Field-Effect Transistor"),
                OptionDraft::wrong("b", "Metal-Organic-Silicon Field-Effect Transistor"),
                OptionDraft::wrong("c", "Metal-Oxide-Silicon Frequency-Effect Transistor"),
                OptionDraft::wrong("d", "Metal-Organic-Semiconductor Field-Effect Transistor"),
            ],
            "MOSFET stands for Metal-Oxide-Semiconductor Field-Effect Transistor. It is a type \
             of transistor used for switching and amplifying electronic signals.",
        ),
        draft(
            2,
            "CMOS Logic",
            Difficulty::Medium,
            "In CMOS technology, what happens when both NMOS and PMOS transistors are OFF?",
            [
                OptionDraft::wrong("a", "High current flows"),
                OptionDraft::correct("b", "No static current flows"),
                OptionDraft::wrong("c", "Output is undefined"),
                OptionDraft::wrong("d", "Circuit becomes unstable"),
            ],
            "In CMOS, when both transistors are OFF, no static current flows, which is why \
             CMOS has very low static power consumption.",
        ),
        draft(
            3,
            "Doping",
            Difficulty::Easy,
            "Which dopant is commonly used to create N-type silicon?",
            [
                OptionDraft::wrong("a", "Boron"),
                OptionDraft::correct("b", "Phosphorus"),
                OptionDraft::wrong("c", "Aluminum"),
                OptionDraft::wrong("d", "Gallium"),
            ],
            "Phosphorus is a Group V element with 5 valence electrons. When added to silicon \
             (Group IV), it provides an extra electron, creating N-type semiconductor.",
        ),
        draft(
            4,
            "MOSFET",
            Difficulty::Medium,
            "Which region must a MOSFET operate in to act as an amplifier?",
            [
                OptionDraft::wrong("a", "Cutoff"),
                OptionDraft::wrong("b", "Triode (linear)"),
                OptionDraft::correct("c", "Saturation"),
                OptionDraft::wrong("d", "Breakdown"),
            ],
            "In saturation the drain current is set mainly by the gate-source voltage, so the \
             device behaves as a voltage-controlled current source suitable for amplification.",
        ),
        draft(
            5,
            "CMOS Logic",
            Difficulty::Hard,
            "What dominates dynamic power consumption in a CMOS gate?",
            [
                OptionDraft::correct("a", "Charging and discharging load capacitance"),
                OptionDraft::wrong("b", "Gate oxide tunneling"),
                OptionDraft::wrong("c", "Junction leakage"),
                OptionDraft::wrong("d", "Subthreshold conduction"),
            ],
            "Dynamic power is roughly alpha * C * V^2 * f: every output transition charges or \
             discharges the load capacitance.",
        ),
        draft(
            6,
            "P-N Junction",
            Difficulty::Medium,
            "What happens to the depletion region of a P-N junction under reverse bias?",
            [
                OptionDraft::wrong("a", "It narrows"),
                OptionDraft::correct("b", "It widens"),
                OptionDraft::wrong("c", "It disappears"),
                OptionDraft::wrong("d", "It stays the same"),
            ],
            "Reverse bias pulls carriers away from the junction, exposing more fixed charge and \
             widening the depletion region.",
        ),
        draft(
            7,
            "Memory Devices",
            Difficulty::Medium,
            "Why does DRAM need periodic refresh?",
            [
                OptionDraft::wrong("a", "Its transistors wear out"),
                OptionDraft::correct("b", "The storage capacitor leaks charge"),
                OptionDraft::wrong("c", "The sense amplifiers drift"),
                OptionDraft::wrong("d", "The word lines discharge"),
            ],
            "A DRAM bit is stored as charge on a small capacitor that leaks through the access \
             transistor, so it must be read and rewritten every few milliseconds.",
        ),
        draft(
            8,
            "Fabrication",
            Difficulty::Hard,
            "Which process step transfers a circuit pattern from a mask onto the wafer?",
            [
                OptionDraft::wrong("a", "Chemical mechanical polishing"),
                OptionDraft::wrong("b", "Ion implantation"),
                OptionDraft::correct("c", "Photolithography"),
                OptionDraft::wrong("d", "Thermal oxidation"),
            ],
            "Photolithography exposes a photoresist through the mask; the developed resist then \
             defines where etching or implantation happens.",
        ),
        draft(
            9,
            "Doping",
            Difficulty::Medium,
            "Boron doping of silicon produces which type of semiconductor?",
            [
                OptionDraft::correct("a", "P-type"),
                OptionDraft::wrong("b", "N-type"),
                OptionDraft::wrong("c", "Intrinsic"),
                OptionDraft::wrong("d", "Degenerate N-type"),
            ],
            "Boron is a Group III acceptor; each atom leaves a hole in the lattice, making the \
             silicon P-type.",
        ),
    ]
}

/// Validated built-in questions. Drafts that fail validation are skipped with a warning.
#[must_use]
pub fn builtin_questions() -> Vec<Question> {
    builtin_drafts()
        .into_iter()
        .filter_map(|d| {
            let id = d.id;
            match d.validate() {
                Ok(q) => Some(q),
                Err(err) => {
                    tracing::warn!(question_id = %id, error = %err, "skipping invalid built-in question");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_builtin_draft_validates() {
        for d in builtin_drafts() {
            let id = d.id;
            assert!(d.validate().is_ok(), "question {id} failed validation");
        }
    }

    #[test]
    fn builtin_ids_are_unique_and_topics_known() {
        let questions = builtin_questions();
        let ids: HashSet<_> = questions.iter().map(Question::id).collect();
        assert_eq!(ids.len(), questions.len());
        for q in &questions {
            assert!(KNOWN_TOPICS.contains(&q.category()), "{}", q.category());
        }
    }
}
