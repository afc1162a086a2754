// Sourcemaps Tests

#[cfg(test)]
mod tests {
    use crate::sourcemaps::*;

    fn mapping(generated: (u32, u32), original: (u32, u32)) -> Mapping {
        Mapping {
            generated: Position::new(generated.0, generated.1),
            original: Position::new(original.0, original.1),
        }
    }

    mod position_map_tests {
        use super::*;

        #[test]
        fn should_replace_mapping_at_same_generated_position() {
            let mut map = PositionMap::new();
            map.add(mapping((0, 0), (0, 0)));
            map.add(mapping((0, 0), (3, 4)));
            assert_eq!(map.mappings(), &[mapping((0, 0), (3, 4))]);
        }

        #[test]
        fn should_interpolate_columns_after_a_mapping() {
            let mut map = PositionMap::new();
            map.add(mapping((0, 0), (0, 0)));
            map.add(mapping((2, 0), (5, 0)));
            assert_eq!(
                map.original_position_for(Position::new(2, 10)),
                Some(Position::new(5, 10))
            );
            assert_eq!(map.original_position_for(Position::new(1, 3)), None);
        }
    }

    mod source_map_tests {
        use super::*;

        #[test]
        fn should_encode_a_single_source_map() {
            let mut map = PositionMap::new();
            map.add(mapping((0, 0), (0, 0)));
            map.add(mapping((1, 0), (2, 0)));
            map.add(mapping((1, 4), (2, 6)));
            let source_map = map
                .to_source_map("out.ts", "in.ts", Some("content"))
                .unwrap();
            assert_eq!(source_map.version, 3);
            assert_eq!(source_map.file.as_deref(), Some("out.ts"));
            assert_eq!(source_map.sources, vec!["in.ts".to_string()]);
            assert_eq!(source_map.sources_content, vec![Some("content".to_string())]);
            assert_eq!(source_map.mappings, "AAAA;AAEA,IAAM");
        }

        #[test]
        fn should_not_produce_a_map_without_mappings() {
            assert!(PositionMap::new().to_source_map("o", "i", None).is_none());
        }

        #[test]
        fn should_serialize_with_v3_field_names() {
            let mut generator = SourceMapGenerator::new(Some("out.js".to_string()));
            generator.add_source("a.ts", None).add_line();
            generator.add_mapping(0, "a.ts", 0, 0).unwrap();
            let json = generator.to_json().unwrap().to_json().unwrap();
            assert!(json.contains("\"sourceRoot\":\"\""));
            assert!(json.contains("\"sourcesContent\":[null]"));
            assert!(json.contains("\"mappings\":\"AAAA\""));
        }

        #[test]
        fn should_reject_unknown_sources_and_out_of_order_mappings() {
            let mut generator = SourceMapGenerator::new(None);
            generator.add_source("a.ts", None);
            assert!(generator.add_mapping(0, "a.ts", 0, 0).is_err());
            generator.add_line();
            assert!(generator.add_mapping(0, "b.ts", 0, 0).is_err());
            generator.add_mapping(5, "a.ts", 0, 0).unwrap();
            assert!(generator.add_mapping(2, "a.ts", 0, 0).is_err());
        }

        #[test]
        fn should_render_inline_comment() {
            let mut map = PositionMap::new();
            map.add(mapping((0, 0), (0, 0)));
            let comment = map
                .to_source_map("o.ts", "i.ts", None)
                .unwrap()
                .to_js_comment()
                .unwrap();
            assert!(comment.starts_with("//# sourceMappingURL=data:application/json;base64,"));
        }
    }
}
