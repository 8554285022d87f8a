//! Unit tests for vecform.

use vecform::parser::{parse_formula, ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp};
use vecform::translate::{translate_condition, translate_expression, translate_formula};
use vecform::{CsvStoreConfig, Formula, RunnerConfig, VecformError};

// =============================================================================
// Error Tests
// =============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = VecformError::ParseError {
            line: 1,
            col: 5,
            message: "unexpected token".into(),
        };
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("column 5"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_arity_mismatch_display() {
        let err = VecformError::ArityMismatch {
            function: "clip".into(),
            expected: "3".into(),
            actual: 1,
        };
        assert_eq!(err.to_string(), "Function clip expects 3 argument(s), got 1");
    }

    #[test]
    fn test_formula_failed_display_and_source() {
        let err = VecformError::UnknownColumn("e".into()).for_formula(42);
        assert_eq!(err.to_string(), "Formula 42 failed: Unknown column: e");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Unknown column: e"));
    }

    #[test]
    fn test_for_formula_does_not_nest() {
        let err = VecformError::UnknownFunction("floor".into())
            .for_formula(1)
            .for_formula(2);
        assert!(matches!(err, VecformError::FormulaFailed { formula_id: 1, .. }));
    }

    #[test]
    fn test_batch_too_large_display() {
        let err = VecformError::BatchTooLarge {
            rows: 501,
            limit: 500,
        };
        assert!(err.to_string().contains("501"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VecformError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}

// =============================================================================
// Translator Tests
// =============================================================================

mod translator_tests {
    use super::*;

    #[test]
    fn test_expression_with_every_function() {
        let source = "SQRT(a) + POWER(b, 2) - LN(c) * ABS(d) / ROUND(a, 1) + EXP(b)";
        assert_eq!(
            translate_expression(source),
            "sqrt(a) + power(b, 2) - log(c) * abs(d) / round(a, 1) + exp(clip(b, -700, 700))"
        );
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(
            translate_expression("SQRT(ABS(a - b))"),
            "sqrt(abs(a - b))"
        );
        assert_eq!(
            translate_expression("EXP(LN(a) * 2)"),
            "exp(clip(log(a) * 2, -700, 700))"
        );
    }

    #[test]
    fn test_condition_mixed_connectives() {
        assert_eq!(
            translate_condition("a >= 1 AND b <> 2 OR c = 3"),
            "a >= 1 & b != 2 | c == 3"
        );
    }

    #[test]
    fn test_condition_keywords_need_word_boundaries() {
        assert_eq!(translate_condition("ANDa > 1"), "ANDa > 1");
        assert_eq!(translate_condition("a > 1 AND(b > 2)"), "a > 1 &(b > 2)");
    }

    #[test]
    fn test_translate_formula_rewrites_condition_functions() {
        let formula = Formula::new(7, "a")
            .with_condition("ABS(d) > 1 AND c = 0")
            .with_false_expression("SQRT(b)");
        let translated = translate_formula(&formula);
        assert_eq!(translated.formula_id, 7);
        assert_eq!(translated.condition.as_deref(), Some("abs(d) > 1 & c == 0"));
        assert_eq!(translated.false_expression.as_deref(), Some("sqrt(b)"));
    }

    #[test]
    fn test_false_expression_dropped_without_condition() {
        let formula = Formula::new(1, "a").with_false_expression("b");
        assert!(translate_formula(&formula).false_expression.is_none());
    }
}

// =============================================================================
// Parser Tests
// =============================================================================

mod parser_tests {
    use super::*;

    fn column(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(name.into()))
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_formula("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::Arithmetic {
                left: column("a"),
                op: ArithmeticOp::Add,
                right: Box::new(Expr::Arithmetic {
                    left: column("b"),
                    op: ArithmeticOp::Mul,
                    right: column("c"),
                }),
            }
        );
    }

    #[test]
    fn test_parse_logical_binds_looser_than_comparison() {
        let expr = parse_formula("a > 1 & b == 2").unwrap();
        let Expr::Logical { op, left, right } = expr else {
            panic!("expected logical expression");
        };
        assert_eq!(op, LogicalOp::And);
        assert!(matches!(*left, Expr::Comparison { op: ComparisonOp::Gt, .. }));
        assert!(matches!(*right, Expr::Comparison { op: ComparisonOp::Eq, .. }));
    }

    #[test]
    fn test_parse_call() {
        let expr = parse_formula("clip(a, -700, 700)").unwrap();
        let Expr::Call { function, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(function, Function::Clip);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_columns_in_order_without_duplicates() {
        let expr = parse_formula("d * a + power(d, 2) - b").unwrap();
        assert_eq!(expr.columns(), vec!["d", "a", "b"]);
    }

    #[test]
    fn test_parse_rejects_untranslated_source() {
        assert!(parse_formula("a = 1").is_err());
        assert!(parse_formula("a > 1 AND b > 2").is_err());
        assert!(matches!(
            parse_formula("SQRT(a)"),
            Err(VecformError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_parse_rejects_chained_comparison() {
        assert!(parse_formula("a < b < c").is_err());
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = parse_formula("a + * b").unwrap_err();
        assert!(matches!(err, VecformError::ParseError { line: 1, .. }));
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_runner_config_builder() {
        let config = RunnerConfig::new()
            .with_method("bench")
            .with_result_batch_size(128);
        assert_eq!(config.method, "bench");
        assert_eq!(config.result_batch_size, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_runner_config_rejects_zero_batch() {
        let err = RunnerConfig::new()
            .with_result_batch_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, VecformError::ConfigError(_)));
    }

    #[test]
    fn test_csv_store_config_paths() {
        let config = CsvStoreConfig::new("work").with_formulas_file("f.csv");
        assert_eq!(config.formulas_path(), std::path::Path::new("work/f.csv"));
        assert!(config.validate().is_ok());
    }
}
