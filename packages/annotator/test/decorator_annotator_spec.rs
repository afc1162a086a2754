/**
 * Decorator Annotator Tests
 *
 * End-to-end behaviour of decorator lowering on whole programs.
 */

#[cfg(test)]
mod tests {
    use decorator_annotator::diagnostics::format_diagnostics;
    use decorator_annotator::sourcemaps::Position;
    use decorator_annotator::{AnnotatorOptions, DecoratorOutput, EmitMode, Program};

    const TEST_CASE_FILE_NAME: &str = "testcase.ts";

    const DECORATORS_HEADER: &str = "static decorators: {type: Function, args?: any[]}[] = [\n";
    const CTOR_PARAMETERS_HEADER: &str = "/** @nocollapse */\nstatic ctorParameters: () => ({type: any, decorators?: {type: Function, args?: any[]}[]}|null)[] = () => [\n";
    const PROP_DECORATORS_HEADER: &str =
        "static propDecorators: {[key: string]: {type: Function, args?: any[]}[]} = {\n";

    fn create_program(source_text: &str) -> Program {
        let mut program = Program::new();
        program
            .add_file(
                "bar.d.ts",
                "export declare class BarService {}\nexport interface BarOptions {}\n",
            )
            .unwrap();
        program.add_file(TEST_CASE_FILE_NAME, source_text).unwrap();
        program
    }

    fn translate_with(source_text: &str, options: &AnnotatorOptions) -> (Program, DecoratorOutput) {
        let program = create_program(source_text);
        let file = program.file_id(TEST_CASE_FILE_NAME).unwrap();
        let output = program.convert_decorators(file, options).unwrap();
        (program, output)
    }

    fn translate(source_text: &str) -> String {
        let (_, result) = translate_with(source_text, &AnnotatorOptions::default());
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
        // The output must still be a valid program.
        create_program(&result.output);
        result.output
    }

    fn expect_unchanged(source_text: &str) {
        assert_eq!(translate(source_text), source_text);
    }

    /// Class metadata block: class decorators, ctor parameter slots, then prop decorators.
    fn metadata(decorators: Option<&str>, ctor_parameters: Option<&str>, props: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(decorators) = decorators {
            out.push_str(DECORATORS_HEADER);
            out.push_str(decorators);
            out.push_str("];\n");
        }
        if let Some(ctor_parameters) = ctor_parameters {
            out.push_str(CTOR_PARAMETERS_HEADER);
            out.push_str(ctor_parameters);
            out.push_str("];\n");
        }
        if let Some(props) = props {
            out.push_str(PROP_DECORATORS_HEADER);
            out.push_str(props);
            out.push_str("};\n");
        }
        out
    }

    mod source_map_tests {
        use super::*;

        #[test]
        fn should_generate_a_source_map() {
            let options = AnnotatorOptions {
                source_map: true,
                ..AnnotatorOptions::default()
            };
            let (_, result) = translate_with(
                "\n/** @Annotation */ let Test1: Function;\n@Test1\nexport class Foo {\n}\nlet X = 'a string';",
                &options,
            );
            let string_x_line = result
                .output
                .lines()
                .position(|line| line.contains("a string"))
                .unwrap() as u32;
            let map = result.position_map.unwrap();
            let original = map
                .original_position_for(Position::new(string_x_line, 10))
                .unwrap();
            assert_eq!(original.line, 5, "string X definition");

            let encoded = map
                .to_source_map(TEST_CASE_FILE_NAME, TEST_CASE_FILE_NAME, None)
                .unwrap();
            assert_eq!(encoded.sources, vec![TEST_CASE_FILE_NAME.to_string()]);
        }
    }

    mod class_decorator_tests {
        use super::*;

        #[test]
        fn should_leave_plain_classes_alone() {
            expect_unchanged("class Foo {}");
        }

        #[test]
        fn should_leave_unmarked_decorators_alone() {
            expect_unchanged(
                "\n          let Decor: Function;\n          @Decor class Foo {\n            constructor(@Decor p: number) {}\n            @Decor m(): void {}\n          }",
            );
        }

        #[test]
        fn should_transform_decorated_classes() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Test1: Function;\n/** @Annotation */ let Test2: Function;\nlet param: any;\n@Test1\n@Test2(param)\nclass Foo {\n  field: string;\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Test1: Function;\n/** @Annotation */ let Test2: Function;\nlet param: any;\n\n\nclass Foo {{\n  field: string;\n{}}}",
                    metadata(
                        Some("{ type: Test1 },\n{ type: Test2, args: [param, ] },\n"),
                        Some(""),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_transform_classes_decorated_with_function_annotations() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ function Test() {};\n@Test\nclass Foo {\n  field: string;\n}"
                ),
                format!(
                    "\n/** @Annotation */ function Test() {{}};\n\nclass Foo {{\n  field: string;\n{}}}",
                    metadata(Some("{ type: Test },\n"), Some(""), None)
                )
            );
        }

        #[test]
        fn should_transform_classes_with_exported_annotation_declarations() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ export let Test: Function;\n@Test\nclass Foo {\n  field: string;\n}"
                ),
                format!(
                    "\n/** @Annotation */ export let Test: Function;\n\nclass Foo {{\n  field: string;\n{}}}",
                    metadata(Some("{ type: Test },\n"), Some(""), None)
                )
            );
        }

        #[test]
        fn should_accept_complicated_decorators() {
            let declarations = "\n/** @Annotation */ let Test1: Function;\n/** @Annotation */ let Test2: Function;\n/** @Annotation */ let Test3: Function;\n/** @Annotation */ function Test4<T>(param: any): ClassDecorator { return null; }\nlet param: any;\n";
            assert_eq!(
                translate(&format!(
                    "{}@Test1({{name: 'percentPipe'}}, class ZZZ {{}})\n@Test2\n@Test3()\n@Test4<string>(param)\nclass Foo {{\n}}",
                    declarations
                )),
                format!(
                    "{}\n\n\n\nclass Foo {{\n{}}}",
                    declarations,
                    metadata(
                        Some(
                            "{ type: Test1, args: [{name: 'percentPipe'}, class ZZZ {}, ] },\n\
                             { type: Test2 },\n\
                             { type: Test3 },\n\
                             { type: Test4, args: [param, ] },\n"
                        ),
                        Some(""),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_not_eat_export() {
            assert_eq!(
                translate("\n/** @Annotation */ let Test1: Function;\n@Test1\nexport class Foo {\n}"),
                format!(
                    "\n/** @Annotation */ let Test1: Function;\n\nexport class Foo {{\n{}}}",
                    metadata(Some("{ type: Test1 },\n"), Some(""), None)
                )
            );
        }

        #[test]
        fn should_handle_nested_classes() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Test1: Function;\n/** @Annotation */ let Test2: Function;\n@Test1\nexport class Foo {\n  foo() {\n    @Test2\n    class Bar {\n    }\n  }\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Test1: Function;\n/** @Annotation */ let Test2: Function;\n\nexport class Foo {{\n  foo() {{\n    \n    class Bar {{\n    {}}}\n  }}\n{}}}",
                    metadata(Some("{ type: Test2 },\n"), Some(""), None),
                    metadata(Some("{ type: Test1 },\n"), Some(""), None)
                )
            );
        }
    }

    mod ctor_decorator_tests {
        use super::*;

        #[test]
        fn should_ignore_ctors_without_applicable_injects() {
            expect_unchanged(
                "\nimport {BarService} from 'bar';\nclass Foo {\n  constructor(bar: BarService, num: number) {\n  }\n}",
            );
        }

        #[test]
        fn should_transform_injected_ctors() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Inject: Function;\nenum AnEnum { ONE, TWO, };\nabstract class AbstractService {}\nclass Foo {\n  constructor(@Inject bar: AbstractService, @Inject('enum') num: AnEnum) {\n  }\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Inject: Function;\nenum AnEnum {{ ONE, TWO, }};\nabstract class AbstractService {{}}\nclass Foo {{\n  constructor( bar: AbstractService,  num: AnEnum) {{\n  }}\n{}}}",
                    metadata(
                        None,
                        Some(
                            "{type: AbstractService, decorators: [{ type: Inject }, ]},\n\
                             {type: AnEnum, decorators: [{ type: Inject, args: ['enum', ] }, ]},\n"
                        ),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_store_plain_parameters_of_decorated_classes() {
            assert_eq!(
                translate(
                    "\nimport {BarService} from 'bar';\n/** @Annotation */ let Test1: Function;\n@Test1()\nclass Foo {\n  constructor(bar: BarService, num: number) {\n  }\n}"
                ),
                format!(
                    "\nimport {{BarService}} from 'bar';\n/** @Annotation */ let Test1: Function;\n\nclass Foo {{\n  constructor(bar: BarService, num: number) {{\n  }}\n{}}}",
                    metadata(Some("{ type: Test1 },\n"), Some("{type: BarService, },\nnull,"), None)
                )
            );
        }

        #[test]
        fn should_handle_complex_ctor_parameters() {
            assert_eq!(
                translate(
                    "\nimport * as bar from 'bar';\n/** @Annotation */ let Inject: Function;\nlet param: any;\nclass Foo {\n  constructor(@Inject(param) x: bar.BarService, {a, b}, defArg = 3, optional?: bar.BarService) {\n  }\n}"
                ),
                format!(
                    "\nimport * as bar from 'bar';\n/** @Annotation */ let Inject: Function;\nlet param: any;\nclass Foo {{\n  constructor( x: bar.BarService, {{a, b}}, defArg = 3, optional?: bar.BarService) {{\n  }}\n{}}}",
                    metadata(
                        None,
                        Some(
                            "{type: bar.BarService, decorators: [{ type: Inject, args: [param, ] }, ]},\n\
                             null, null,\n\
                             {type: bar.BarService, },\n"
                        ),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_keep_dotted_paths_into_local_namespaces() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Test1: Function;\nnamespace ns { export class Thing {} }\n@Test1\nclass Foo {\n  constructor(t: ns.Thing) {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Test1: Function;\nnamespace ns {{ export class Thing {{}} }}\n\nclass Foo {{\n  constructor(t: ns.Thing) {{}}\n{}}}",
                    metadata(Some("{ type: Test1 },\n"), Some("{type: ns.Thing, },\n"), None)
                )
            );
        }

        #[test]
        fn should_not_reference_interfaces_of_imported_namespaces() {
            assert_eq!(
                translate(
                    "\nimport * as bar from 'bar';\n/** @Annotation */ let Inject: Function;\nclass Foo {\n  constructor(@Inject s: bar.BarService, @Inject o: bar.BarOptions) {}\n}"
                ),
                format!(
                    "\nimport * as bar from 'bar';\n/** @Annotation */ let Inject: Function;\nclass Foo {{\n  constructor( s: bar.BarService,  o: bar.BarOptions) {{}}\n{}}}",
                    metadata(
                        None,
                        Some(
                            "{type: bar.BarService, decorators: [{ type: Inject }, ]},\n\
                             {type: undefined, decorators: [{ type: Inject }, ]},\n"
                        ),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_include_decorators_for_primitive_parameters() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Inject: Function;\nlet APP_ID: any;\nclass ViewUtils {\n  constructor(@Inject(APP_ID) private _appId: string) {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Inject: Function;\nlet APP_ID: any;\nclass ViewUtils {{\n  constructor( private _appId: string) {{}}\n{}}}",
                    metadata(
                        None,
                        Some("{type: undefined, decorators: [{ type: Inject, args: [APP_ID, ] }, ]},\n"),
                        None
                    )
                )
            );
        }

        #[test]
        fn should_strip_generic_type_arguments() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Inject: Function;\nclass Foo {\n  constructor(@Inject typed: Promise<string>) {\n  }\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Inject: Function;\nclass Foo {{\n  constructor( typed: Promise<string>) {{\n  }}\n{}}}",
                    metadata(None, Some("{type: Promise, decorators: [{ type: Inject }, ]},\n"), None)
                )
            );
        }

        #[test]
        fn should_avoid_using_interfaces_as_values() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Inject: Function = null;\nclass Class {}\ninterface Iface {}\nclass Foo {\n  constructor(@Inject aClass: Class, @Inject aIface: Iface) {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Inject: Function = null;\nclass Class {{}}\ninterface Iface {{}}\nclass Foo {{\n  constructor( aClass: Class,  aIface: Iface) {{}}\n{}}}",
                    metadata(
                        None,
                        Some(
                            "{type: Class, decorators: [{ type: Inject }, ]},\n\
                             {type: undefined, decorators: [{ type: Inject }, ]},\n"
                        ),
                        None
                    )
                )
            );
        }
    }

    mod method_decorator_tests {
        use super::*;

        #[test]
        fn should_leave_ordinary_methods_alone() {
            expect_unchanged("\nclass Foo {\n  bar() {}\n}");
        }

        #[test]
        fn should_gather_decorators_from_methods() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let Test1: Function;\nclass Foo {\n  @Test1('somename')\n  bar() {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let Test1: Function;\nclass Foo {{\n  \n  bar() {{}}\n{}}}",
                    metadata(None, None, Some("\"bar\": [{ type: Test1, args: ['somename', ] },],\n"))
                )
            );
        }

        #[test]
        fn should_gather_decorators_from_fields_and_setters() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let PropDecorator: Function;\nclass ClassWithDecorators {\n  @PropDecorator(\"p1\") @PropDecorator(\"p2\") a;\n  b;\n\n  @PropDecorator(\"p3\")\n  set c(value) {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let PropDecorator: Function;\nclass ClassWithDecorators {{\n    a;\n  b;\n\n  \n  set c(value) {{}}\n{}}}",
                    metadata(
                        None,
                        None,
                        Some(
                            "\"a\": [{ type: PropDecorator, args: [\"p1\", ] },{ type: PropDecorator, args: [\"p2\", ] },],\n\
                             \"c\": [{ type: PropDecorator, args: [\"p3\", ] },],\n"
                        )
                    )
                )
            );
        }

        #[test]
        fn should_let_the_last_same_named_member_win() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let P: Function;\nclass Foo {\n  @P() get x() { return 1; }\n  @P(2) set x(v) {}\n}"
                ),
                format!(
                    "\n/** @Annotation */ let P: Function;\nclass Foo {{\n   get x() {{ return 1; }}\n   set x(v) {{}}\n{}}}",
                    metadata(None, None, Some("\"x\": [{ type: P, args: [2, ] },],\n"))
                )
            );
        }

        #[test]
        fn should_error_on_weird_class_members() {
            let (program, result) = translate_with(
                "\n/** @Annotation */ let Test1: Function;\nlet param: any;\nclass Foo {\n  @Test1('somename')\n  [param]() {}\n}",
                &AnnotatorOptions::default(),
            );
            assert_eq!(
                format_diagnostics(&result.diagnostics, |name| program.source_file_by_name(name)),
                "Error at testcase.ts:5:3: cannot process decorators on strangely named member"
            );
            assert!(result.output.contains("  @Test1('somename')\n  [param]() {}\n}"));
        }

        #[test]
        fn should_avoid_mangling_code_relying_on_asi() {
            assert_eq!(
                translate(
                    "\n/** @Annotation */ let PropDecorator: Function;\nclass Foo {\n  missingSemi = () => {}\n  @PropDecorator other: number;\n}"
                ),
                format!(
                    "\n/** @Annotation */ let PropDecorator: Function;\nclass Foo {{\n  missingSemi = () => {{}}\n   other: number;\n{}}}",
                    metadata(None, None, Some("\"other\": [{ type: PropDecorator },],\n"))
                )
            );
        }
    }

    mod declaration_mode_tests {
        use super::*;

        #[test]
        fn should_emit_typed_field_declarations() {
            let options = AnnotatorOptions {
                emit_mode: EmitMode::Declarations,
                ..AnnotatorOptions::default()
            };
            let (_, result) = translate_with(
                "\n/** @Annotation */ let Test1: Function;\n@Test1\nclass Foo {\n  @Test1 a: string;\n}",
                &options,
            );
            assert!(result.diagnostics.is_empty());
            assert_eq!(
                result.output,
                "\n/** @Annotation */ let Test1: Function;\n\nclass Foo {\n   a: string;\n\
                 /** @type {!Array<{type: !Function, args: (undefined|!Array<?>)}>} */\n\
                 static declare decorators: {type: Function, args?: any[]}[];\n\
                 /**\n * @nocollapse\n * @type {function(): !Array<(null|{type: ?, decorators: (undefined|!Array<{type: !Function, args: (undefined|!Array<?>)}>)})>}\n */\n\
                 static declare ctorParameters: () => ({type: any, decorators?: {type: Function, args?: any[]}[]}|null)[];\n\
                 /** @type {!Object<string,!Array<{type: !Function, args: (undefined|!Array<?>)}>>} */\n\
                 static declare propDecorators: {[key: string]: {type: Function, args?: any[]}[]};\n\
                 }"
            );
        }
    }

    mod fixture_tests {
        use super::*;

        const EXTERNAL: &str = "export class AClass {}\nexport interface AType {}\nexport class AClassWithGenerics<T> {}\n";

        const DECORATOR_TEST_HEAD: &str = "import {AClass, AClass as ARenamedClass, AType, AClassWithGenerics} from './external';

function decorator(a: Object, b: string) {}

/** @Annotation */
function annotationDecorator(a: Object, b: string) {}

function classDecorator(t: any) { return t; }

type classAnnotation = {};
// The type alias shares its name with the annotation below but has no marker.

/** @Annotation */
function classAnnotation(t: any) { return t; }

";

        #[test]
        fn should_lower_the_decorated_fixture() {
            let input = format!(
                "{}@classAnnotation
class DecoratorTest {{
  constructor(a: any[], n: number, b: boolean, promise: Promise<string>, arr: Array<string>, aClass: AClass, AClass: AClass, aRenamedClass: ARenamedClass, aClassWithGenerics: AClassWithGenerics<string>, aType: AType) {{}}

  @annotationDecorator
  get w(): number {{
    return 1;
  }}

  /** Some comment */
  @decorator
  private x: number;

  @annotationDecorator
  private y: number;

  @decorator
  private z: AClass;
}}

@classDecorator
class DecoratedClass {{
  z: string;
}}
",
                DECORATOR_TEST_HEAD
            );

            let mut program = Program::new();
            program.add_file("external.ts", EXTERNAL).unwrap();
            let file = program.add_file("decorator.ts", &input).unwrap();
            let result = program
                .convert_decorators(file, &AnnotatorOptions::default())
                .unwrap();
            assert!(result.diagnostics.is_empty());

            let expected = format!(
                "{}
class DecoratorTest {{
  constructor(a: any[], n: number, b: boolean, promise: Promise<string>, arr: Array<string>, aClass: AClass, AClass: AClass, aRenamedClass: ARenamedClass, aClassWithGenerics: AClassWithGenerics<string>, aType: AType) {{}}

  \n  get w(): number {{
    return 1;
  }}

  /** Some comment */
  @decorator
  private x: number;

  \n  private y: number;

  @decorator
  private z: AClass;
{}}}

@classDecorator
class DecoratedClass {{
  z: string;
}}
",
                DECORATOR_TEST_HEAD,
                metadata(
                    Some("{ type: classAnnotation },\n"),
                    Some(
                        "{type: Array, },\n\
                         null, null,\n\
                         {type: Promise, },\n\
                         {type: Array, },\n\
                         {type: AClass, },\n\
                         {type: AClass, },\n\
                         {type: ARenamedClass, },\n\
                         {type: AClassWithGenerics, },\n\
                         null,"
                    ),
                    Some(
                        "\"w\": [{ type: annotationDecorator },],\n\
                         \"y\": [{ type: annotationDecorator },],\n"
                    )
                )
            );
            assert_eq!(result.output, expected);
        }
    }
}
