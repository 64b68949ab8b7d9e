//! Context assembly for entity summarization.
//!
//! Triples are rendered to one entry each, shuffled, and packed into a
//! character budget. Shuffling means an over-budget entity keeps a random
//! subset of its triples rather than whichever were extracted first.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::edges::Triple;
use crate::utils::text::char_len;

/// Render `triples` as `"{n}: {subject}, {object}, {predicate} - Summary: {description}"`,
/// numbered from 1 in input order. Fields are written verbatim.
pub fn render_triples(triples: &[Triple]) -> Vec<String> {
    triples
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}: {}, {}, {} - Summary: {}",
                i + 1,
                t.subject,
                t.object,
                t.predicate,
                t.description,
            )
        })
        .collect()
}

/// Shuffle `lines` in place, then join the longest prefix whose summed line
/// length stays within `budget` characters.
///
/// Separators are not counted, so the returned block may exceed `budget` by
/// up to one newline per included line. Packing stops at the first line that
/// does not fit; shorter lines after it are not considered.
pub fn assemble_context<R: Rng + ?Sized>(lines: &mut [String], budget: usize, rng: &mut R) -> String {
    lines.shuffle(rng);

    let mut used = 0;
    let mut included: Vec<&str> = Vec::new();
    for line in lines.iter() {
        let len = char_len(line);
        if used + len > budget {
            break;
        }
        used += len;
        included.push(line);
    }

    included.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn triple(i: usize, description_len: usize) -> Triple {
        Triple::new(
            format!("subject-{i}"),
            "RELATED_TO",
            format!("object-{i}"),
            "x".repeat(description_len),
        )
    }

    fn included_length(block: &str) -> usize {
        if block.is_empty() {
            return 0;
        }
        block.split('\n').map(char_len).sum()
    }

    #[test]
    fn renders_documented_line_format() {
        let triples = vec![
            Triple::new("Alice", "WORKS_AT", "Acme", "Alice is employed by Acme."),
            Triple::new("Alice", "KNOWS", "Bob", "Colleagues."),
        ];
        let lines = render_triples(&triples);
        assert_eq!(
            lines,
            vec![
                "1: Alice, Acme, WORKS_AT - Summary: Alice is employed by Acme.",
                "2: Alice, Bob, KNOWS - Summary: Colleagues.",
            ]
        );
    }

    #[test]
    fn renders_fields_verbatim() {
        let triples = vec![Triple::new(" Alice", "WORKS  AT", "Acme\tCorp", "line one\nline two ")];
        let lines = render_triples(&triples);
        assert_eq!(lines[0], "1:  Alice, Acme\tCorp, WORKS  AT - Summary: line one\nline two ");
    }

    #[test]
    fn budget_counts_raw_field_length() {
        let triples = vec![Triple::new("a", "b", "c", "x\n\n\ny")];
        let mut lines = render_triples(&triples);
        let len = char_len(&lines[0]);
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(assemble_context(&mut lines.clone(), len - 1, &mut rng), "");
        assert_eq!(assemble_context(&mut lines, len, &mut rng), "1: a, c, b - Summary: x\n\n\ny");
    }

    #[test]
    fn everything_fits_within_generous_budget() {
        let mut lines = render_triples(&[triple(1, 5), triple(2, 5), triple(3, 5)]);
        let total: usize = lines.iter().map(|l| char_len(l)).sum();
        let mut rng = StdRng::seed_from_u64(7);

        let block = assemble_context(&mut lines, total, &mut rng);
        assert_eq!(block.lines().count(), 3);
        assert_eq!(included_length(&block), total);
    }

    #[test]
    fn empty_when_first_line_exceeds_budget() {
        let mut lines = render_triples(&[triple(1, 50)]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(assemble_context(&mut lines, 10, &mut rng), "");
    }

    #[test]
    fn empty_input_yields_empty_block() {
        let mut lines: Vec<String> = Vec::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(assemble_context(&mut lines, 100, &mut rng), "");
    }

    #[test]
    fn stops_at_first_line_that_does_not_fit() {
        let mut lines = vec!["a".repeat(6), "b".repeat(6), "c".to_string()];
        let mut rng = StdRng::seed_from_u64(3);

        let block = assemble_context(&mut lines, 7, &mut rng);
        let first_overflow = lines
            .iter()
            .scan(0, |used, l| {
                *used += char_len(l);
                Some(*used)
            })
            .position(|used| used > 7)
            .unwrap();
        assert_eq!(block.split('\n').count(), first_overflow);
    }

    #[test]
    fn budget_respected_for_random_triple_sets() {
        let mut source = StdRng::seed_from_u64(0xC0FFEE);
        for seed in 0..200u64 {
            let count = source.gen_range(0..40);
            let triples: Vec<Triple> = (0..count)
                .map(|i| triple(i, source.gen_range(0..120)))
                .collect();
            let budget = source.gen_range(0..2_000);

            let mut lines = render_triples(&triples);
            let mut rng = StdRng::seed_from_u64(seed);
            let block = assemble_context(&mut lines, budget, &mut rng);

            assert!(
                included_length(&block) <= budget,
                "seed {seed}: {} > {budget}",
                included_length(&block)
            );
            let newline_slack = block.matches('\n').count();
            assert!(char_len(&block) <= budget + newline_slack);
        }
    }

    #[test]
    fn budget_respected_across_repeated_calls() {
        let triples: Vec<Triple> = (0..25).map(|i| triple(i, 40)).collect();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut lines = render_triples(&triples);
            let block = assemble_context(&mut lines, 500, &mut rng);
            assert!(included_length(&block) <= 500);
        }
    }

    #[test]
    fn selection_varies_with_random_order() {
        let triples: Vec<Triple> = (0..12).map(|i| triple(i, 10)).collect();

        let mut first = render_triples(&triples);
        let mut second = render_triples(&triples);
        assemble_context(&mut first, 0, &mut StdRng::seed_from_u64(1));
        assemble_context(&mut second, 0, &mut StdRng::seed_from_u64(2));

        assert_ne!(first, second);
        let mut sorted_first = first.clone();
        let mut sorted_second = second.clone();
        sorted_first.sort();
        sorted_second.sort();
        assert_eq!(sorted_first, sorted_second);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let triples: Vec<Triple> = (0..12).map(|i| triple(i, 10)).collect();
        let mut a = render_triples(&triples);
        let mut b = render_triples(&triples);

        let block_a = assemble_context(&mut a, 120, &mut StdRng::seed_from_u64(9));
        let block_b = assemble_context(&mut b, 120, &mut StdRng::seed_from_u64(9));
        assert_eq!(block_a, block_b);
    }
}
