//! Core processing engine
//!
//! Streams terms from one or two dictionaries through a selection and into a
//! single output document.

use crate::cli::Args;
use crate::error::Result;
use crate::filter::Selection;
use crate::output::{Envelope, OutputSummary, OutputWriter, DEFAULT_BUFFER_SIZE};
use crate::progress::{
    create_term_spinner, print_counts_line, print_filter_summary, print_header, print_info,
    print_merge_summary, print_success, TermCounts,
};
use crate::reader::TermReader;

use colored::*;
use log::{debug, info, log_enabled, Level};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub output: PathBuf,
    pub envelope: Envelope,
    pub buffer_size: usize,
    pub quiet: bool,
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            output: args.output.clone(),
            envelope: Envelope::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            quiet: args.quiet,
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(crate::output::DEFAULT_OUTPUT_NAME),
            envelope: Envelope::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            quiet: true,
        }
    }
}

/// Result of a single-document filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterReport {
    pub counts: TermCounts,
    pub output: OutputSummary,
}

/// Result of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub first: TermCounts,
    pub second: TermCounts,
    pub output: OutputSummary,
}

impl MergeReport {
    /// Disabled terms across both sources
    pub fn disabled(&self) -> u64 {
        self.first.disabled + self.second.disabled
    }
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Write the terms of `input` that pass `selection`
    pub fn filter(&self, input: &Path, selection: &Selection) -> Result<FilterReport> {
        let start = Instant::now();

        if !self.config.quiet {
            print_header(&format!("Selecting {}...", selection.describe()));
            print_info(&format!("Input:  {:?}", input));
            print_info(&format!("Output: {:?}", self.config.output));
        }
        info!("Filtering {:?} for {}", input, selection.describe());

        let reader = TermReader::open(input)?;
        let mut output = self.create_output()?;
        let counts = self.pump(reader, selection, &mut output)?;
        let output = output.finish()?;

        info!(
            "Wrote {} of {} terms ({} disabled) to {:?}",
            counts.selected, counts.scanned, counts.disabled, output.path
        );

        if self.config.quiet {
            print_counts_line(&counts, &output);
        } else {
            print_success(&format!("Output written to: {:?}", output.path));
            print_filter_summary(&counts, &output, start.elapsed());
        }

        Ok(FilterReport { counts, output })
    }

    /// Write the enabled terms of `first` followed by those of `second`
    pub fn merge(&self, first: &Path, second: &Path) -> Result<MergeReport> {
        let start = Instant::now();

        if !self.config.quiet {
            print_header("Merging dictionaries...");
            print_info(&format!("File A: {:?}", first));
            print_info(&format!("File B: {:?}", second));
            print_info(&format!("Output: {:?}", self.config.output));
        }
        info!("Merging {:?} and {:?}", first, second);

        // Both inputs must exist before the output is created
        let first_reader = TermReader::open(first)?;
        let second_reader = TermReader::open(second)?;

        let mut output = self.create_output()?;
        let first_counts = self.pump(first_reader, &Selection::RemoveDisabled, &mut output)?;
        let second_counts = self.pump(second_reader, &Selection::RemoveDisabled, &mut output)?;
        let output = output.finish()?;

        let report = MergeReport {
            first: first_counts,
            second: second_counts,
            output,
        };

        info!(
            "Merged {} + {} terms ({} disabled) into {:?}",
            report.first.selected,
            report.second.selected,
            report.disabled(),
            report.output.path
        );

        if self.config.quiet {
            print_counts_line(&(report.first + report.second), &report.output);
        } else {
            print_success(&format!("Output written to: {:?}", report.output.path));
            print_merge_summary(
                [(first, &report.first), (second, &report.second)],
                &report.output,
                start.elapsed(),
            );
        }

        Ok(report)
    }

    fn create_output(&self) -> Result<OutputWriter> {
        OutputWriter::new(
            self.config.output.clone(),
            &self.config.envelope,
            self.config.buffer_size,
        )
    }

    /// Run every term of one document through the disabled check and the
    /// selection, appending survivors to `output`
    fn pump<R: BufRead>(
        &self,
        reader: TermReader<R>,
        selection: &Selection,
        output: &mut OutputWriter,
    ) -> Result<TermCounts> {
        let mut counts = TermCounts::new();
        let source = reader.source().to_path_buf();
        let label = format!("from {:?}", source.file_name().unwrap_or_default());
        let pb = create_term_spinner(&label, self.config.quiet);

        for term in reader {
            let term = term?;
            counts.add_scanned();
            pb.inc(1);

            if term.is_disabled()? {
                counts.add_disabled();
                if log_enabled!(Level::Debug) {
                    debug!("Skipping disabled term {:?}", term.id()?.unwrap_or_default());
                }
                continue;
            }

            if !selection.matches(&term)? {
                continue;
            }

            output.write_fragment(term.as_bytes())?;
            counts.add_selected();
        }

        pb.finish_with_message("Complete".green().to_string());
        debug!("{:?}: {:?}", source, counts);

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DictError;
    use crate::filter::{ElementMatch, GameIds};
    use tempfile::TempDir;

    const SCENARIO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<grimoire version="1.0" timestamp="0"><terms>
<term id="1" disabled="true"><special>true</special><gameId>7</gameId><text>one</text>
</term>
<term id="2"><special>true</special><gameId>7</gameId><text>two</text></term>
<term id="3"><special>false</special><text>three</text></term>
</terms></grimoire>
"#;

    const T2: &str =
        r#"<term id="2"><special>true</special><gameId>7</gameId><text>two</text></term>"#;
    const T3: &str = r#"<term id="3"><special>false</special><text>three</text></term>"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dir: TempDir::new().unwrap() }
        }

        fn input(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("out.xml")
        }

        fn processor(&self) -> Processor {
            Processor::new(ProcessorConfig {
                output: self.output(),
                ..ProcessorConfig::default()
            })
        }

        fn written_terms(&self) -> String {
            let content = std::fs::read_to_string(self.output()).unwrap();
            let envelope = Envelope::default();
            content
                .strip_prefix(envelope.header.as_str())
                .and_then(|s| s.strip_suffix(envelope.footer.as_str()))
                .unwrap()
                .to_string()
        }
    }

    fn counts(scanned: u64, disabled: u64, selected: u64) -> TermCounts {
        TermCounts { scanned, disabled, selected }
    }

    fn ids(list: &[i32]) -> GameIds {
        list.iter().copied().collect()
    }

    #[test]
    fn test_global_scenario() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);

        let report = fx.processor().filter(&input, &Selection::Global).unwrap();

        assert_eq!(report.counts, counts(3, 1, 1));
        assert_eq!(fx.written_terms(), T3);
    }

    #[test]
    fn test_game_specific_scenario() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);

        let report = fx
            .processor()
            .filter(&input, &Selection::GameSpecific(ids(&[7])))
            .unwrap();

        assert_eq!(report.counts, counts(3, 1, 1));
        assert_eq!(fx.written_terms(), T2);
    }

    #[test]
    fn test_remove_scenario() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);

        let report = fx
            .processor()
            .filter(&input, &Selection::RemoveGames(ids(&[7])))
            .unwrap();

        assert_eq!(report.counts, counts(3, 1, 1));
        assert_eq!(fx.written_terms(), T3);
    }

    #[test]
    fn test_remove_disabled_only() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);

        let report = fx.processor().filter(&input, &Selection::RemoveDisabled).unwrap();

        assert_eq!(report.counts, counts(3, 1, 2));
        assert_eq!(fx.written_terms(), format!("{}{}", T2, T3));
    }

    #[test]
    fn test_element_mode() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);

        let selection = Selection::Element(ElementMatch::new("text", "^t").unwrap());
        let report = fx.processor().filter(&input, &selection).unwrap();

        // "one" is disabled and would not match anyway
        assert_eq!(report.counts, counts(3, 1, 2));
        assert_eq!(fx.written_terms(), format!("{}{}", T2, T3));
    }

    #[test]
    fn test_disabled_never_written() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", SCENARIO);
        let selections = [
            Selection::Global,
            Selection::GameSpecific(ids(&[7])),
            Selection::RemoveGames(ids(&[99])),
            Selection::RemoveDisabled,
            Selection::Element(ElementMatch::new("text", ".*").unwrap()),
        ];

        for selection in &selections {
            fx.processor().filter(&input, selection).unwrap();
            assert!(!fx.written_terms().contains("id=\"1\""), "{:?}", selection);
        }
    }

    #[test]
    fn test_remove_and_specific_partition_enabled_terms() {
        let fx = Fixture::new();
        let input = fx.input(
            "dict.xml",
            "<r>\
             <term id=\"a\"><special>true</special><gameId>1</gameId></term>\
             <term id=\"b\"><special>true</special><gameId>2</gameId></term>\
             <term id=\"c\"><gameId>1</gameId></term>\
             <term id=\"d\" disabled=\"true\"><special>true</special><gameId>1</gameId></term>\
             <term id=\"e\"/>\
             </r>",
        );

        let specific = fx
            .processor()
            .filter(&input, &Selection::GameSpecific(ids(&[1])))
            .unwrap();
        let specific_terms = fx.written_terms();
        let removed = fx
            .processor()
            .filter(&input, &Selection::RemoveGames(ids(&[1])))
            .unwrap();
        let removed_terms = fx.written_terms();

        assert_eq!(specific.counts.selected + removed.counts.selected, 4);
        assert!(specific_terms.contains("id=\"a\""));
        for id in ["b", "c", "e"] {
            let needle = format!("id=\"{}\"", id);
            assert!(removed_terms.contains(&needle));
            assert!(!specific_terms.contains(&needle));
        }
    }

    #[test]
    fn test_merge_order_and_counts() {
        let fx = Fixture::new();
        let a = fx.input(
            "a.xml",
            "<r><term id=\"a1\"/><term id=\"a2\" disabled=\"true\"/><term id=\"a3\">x</term></r>",
        );
        let b = fx.input(
            "b.xml",
            "<r><term id=\"b1\" disabled=\"TRUE\"/>\
             <term id=\"b2\"><special>true</special></term></r>",
        );

        let report = fx.processor().merge(&a, &b).unwrap();

        assert_eq!(report.first, counts(3, 1, 2));
        assert_eq!(report.second, counts(2, 1, 1));
        assert_eq!(report.disabled(), 2);
        assert_eq!(report.output.fragments, 3);
        assert_eq!(
            fx.written_terms(),
            "<term id=\"a1\"/><term id=\"a3\">x</term>\
             <term id=\"b2\"><special>true</special></term>"
        );
    }

    #[test]
    fn test_fragments_round_trip_unchanged() {
        let fx = Fixture::new();
        let term = "<term id=\"q&amp;a\" note='&lt;x&gt;'>\n  \
                    <pattern>a &amp; b</pattern>\n  \
                    <text><![CDATA[<i>raw</i> & ]]></text>\n  \
                    <extra><deep attr=\"1\">v</deep></extra>\n\
                    </term>";
        let input = fx.input("dict.xml", &format!("<r>\n{}\n</r>", term));

        fx.processor().filter(&input, &Selection::Global).unwrap();
        assert_eq!(fx.written_terms(), term);
    }

    #[test]
    fn test_malformed_input_keeps_previous_output() {
        let fx = Fixture::new();
        std::fs::write(fx.output(), "previous").unwrap();
        let input = fx.input("bad.xml", "<r><term id=\"1\"/><term><text>x</pattern></term></r>");

        let result = fx.processor().filter(&input, &Selection::Global);

        assert!(matches!(result, Err(DictError::Xml { .. })));
        assert_eq!(std::fs::read_to_string(fx.output()).unwrap(), "previous");
    }

    /// Filter `content` over an existing output and return the error
    fn rejected(content: &str) -> DictError {
        let fx = Fixture::new();
        std::fs::write(fx.output(), "previous").unwrap();
        let input = fx.input("bad.xml", content);

        let err = fx.processor().filter(&input, &Selection::Global).unwrap_err();

        assert_eq!(std::fs::read_to_string(fx.output()).unwrap(), "previous");
        let leftovers = std::fs::read_dir(fx.dir.path()).unwrap().count();
        assert_eq!(leftovers, 2, "staging file left behind");
        err
    }

    #[test]
    fn test_bare_ampersand_is_error() {
        let err = rejected("<r><term id=\"1\"/><term><text>a & b</text></term></r>");
        assert!(matches!(err, DictError::Xml { .. }));
    }

    #[test]
    fn test_lt_in_attribute_is_error() {
        let err = rejected("<r><term id=\"a<b\"/></r>");
        assert!(matches!(err, DictError::Xml { .. }));
    }

    #[test]
    fn test_second_root_is_error() {
        let err = rejected("<r><term id=\"1\"/></r><r2><term id=\"2\"/></r2>");
        assert!(matches!(err, DictError::Xml { .. }));
    }

    #[test]
    fn test_trailing_text_is_error() {
        let err = rejected("<r><term id=\"1\"/></r>junk text");
        assert!(matches!(err, DictError::Xml { .. }));
    }

    #[test]
    fn test_invalid_field_aborts() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", "<r><term disabled=\"nope\"/></r>");

        let result = fx.processor().filter(&input, &Selection::Global);

        assert!(matches!(result, Err(DictError::InvalidField { field: "disabled", .. })));
        assert!(!fx.output().exists());
    }

    #[test]
    fn test_missing_merge_input_creates_nothing() {
        let fx = Fixture::new();
        let a = fx.input("a.xml", "<r/>");
        let missing = fx.dir.path().join("missing.xml");

        let result = fx.processor().merge(&a, &missing);

        assert!(matches!(result, Err(DictError::NotFound { .. })));
        assert!(!fx.output().exists());
    }

    #[test]
    fn test_empty_dictionary() {
        let fx = Fixture::new();
        let input = fx.input("dict.xml", "<grimoire><terms/></grimoire>");

        let report = fx.processor().filter(&input, &Selection::Global).unwrap();

        assert_eq!(report.counts, TermCounts::new());
        assert_eq!(fx.written_terms(), "");
    }
}
