//! Edge case and boundary condition tests for the auxiliary function engine

use dcc_aux::{
    compile,
    hal::{MockConfigStore, MockOutput},
    AuxController, CompileError, CompiledMapping, Condition, ConditionVariable, CvLayout,
    Dimming, Fire, LogicalFunction, MappingAction, MappingMethod, MappingRule, MappingTable,
    MarsLight, OutputId, OutputKind, SoftStartStop, Steady, Strobe,
};

fn intensity_outputs(n: usize) -> Vec<MockOutput> {
    vec![MockOutput::new(OutputKind::Intensity); n]
}

fn single_function(function: LogicalFunction, table: MappingTable) -> AuxController {
    let mut controller = AuxController::new();
    controller
        .install(CompiledMapping::new(vec![function], table))
        .unwrap();
    controller
}

// ============================================================================
// Boundary Value Tests
// ============================================================================

#[test]
fn function_keys_beyond_f28_are_ignored() {
    let mut controller = AuxController::new();
    assert!(controller.set_function_state(28, true));
    assert!(!controller.set_function_state(29, true));
    assert!(!controller.set_function_state(255, true));
    assert!(!controller.state().function_state(29));
}

#[test]
fn full_rcn225_mask_maps_eight_outputs() {
    let mut store = MockConfigStore::new();
    store.set(96, MappingMethod::Rcn225 as u8);
    store.set(37, 0xFF);
    let mapping = compile(&mut store, &CvLayout::default()).unwrap();
    assert_eq!(mapping.functions().len(), 8);
    assert_eq!(mapping.functions()[7].outputs(), [OutputId(8)]);
}

#[test]
fn per_function_mask_reaches_output_24() {
    let mut store = MockConfigStore::new();
    store.set(96, MappingMethod::PerFunction as u8);
    store.fill_page(40, 256, 0);
    for slot in 0..64u16 {
        store.set_indexed(40, 257 + slot * 4 + 3, 0xFF);
    }
    store.set_indexed_bytes(40, 257, &[0, 0, 0x80]);
    let mapping = compile(&mut store, &CvLayout::default()).unwrap();
    assert_eq!(mapping.functions().len(), 1);
    assert_eq!(mapping.functions()[0].outputs(), [OutputId(24)]);
}

#[test]
fn output_zero_never_resolves() {
    let mut outputs = intensity_outputs(2);
    let mut function = LogicalFunction::new(Steady::full()).with_output(OutputId(0));
    function.set_active(true);
    function.update(20, &mut outputs).unwrap();
    assert!(outputs.iter().all(|o| o.write_count == 0));
}

#[test]
fn mapping_beyond_bank_is_a_no_op() {
    let mut store = MockConfigStore::new();
    store.set(96, MappingMethod::Rcn225 as u8);
    store.set(33, 0b1000_0000); // output 8
    let mut controller = AuxController::new();
    controller.load_from_cvs(&mut store).unwrap();

    let mut outputs = intensity_outputs(2);
    controller.set_function_state(0, true);
    controller.tick(20, &mut outputs).unwrap();
    assert!(outputs.iter().all(|o| o.write_count == 0));
}

// ============================================================================
// Sentinel Configuration Tests
// ============================================================================

#[test]
fn unknown_mapping_method_is_empty() {
    let mut store = MockConfigStore::new().with_default(0xFF);
    let mapping = compile(&mut store, &CvLayout::default()).unwrap();
    assert!(mapping.is_empty());
    assert!(store.writes.is_empty());
}

#[test]
fn unprogrammed_v3_page_is_empty() {
    let mut store = MockConfigStore::new().with_default(0xFF);
    store.set(96, MappingMethod::PerOutputV3 as u8);
    let mapping = compile(&mut store, &CvLayout::default()).unwrap();
    assert!(mapping.is_empty());
    assert_eq!(store.writes, [(31, 0), (32, 43)]);
}

#[test]
fn custom_pages_are_selected() {
    let layout = CvLayout::default()
        .with_index_selector(16, 17)
        .with_pages(4, 5, 6, 7);
    let mut store = MockConfigStore::with_layout(layout).with_default(0xFF);
    store.set(96, MappingMethod::PerOutputV2 as u8);
    store.set_indexed(6, 257, 2);
    let mapping = compile(&mut store, &layout).unwrap();
    assert_eq!(store.writes, [(16, 0), (17, 6)]);
    assert_eq!(mapping.functions().len(), 1);
}

// ============================================================================
// Rule Evaluation Tests
// ============================================================================

#[test]
fn empty_condition_variable_always_holds() {
    let mut table = MappingTable::new();
    table.add_condition_variable(ConditionVariable::new(1, &[]).unwrap());
    table.add_rule(MappingRule::new(0, MappingAction::Activate).require(1).unwrap());
    let mut controller =
        single_function(LogicalFunction::new(Steady::new(77)).with_output(OutputId(1)), table);
    let mut outputs = intensity_outputs(1);

    controller.tick(20, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 77);
    assert!(controller.condition_variable_state(1));
}

#[test]
fn unknown_ids_read_false() {
    let mut table = MappingTable::new();
    table.add_rule(MappingRule::new(0, MappingAction::Activate).require(42).unwrap());
    let mut controller =
        single_function(LogicalFunction::new(Steady::full()).with_output(OutputId(1)), table);
    let mut outputs = intensity_outputs(1);

    controller.tick(20, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 0);
    assert!(!controller.condition_variable_state(42));
}

#[test]
fn toggle_dimmed_flips_once_per_pass() {
    let mut table = MappingTable::new();
    table.add_condition_variable(
        ConditionVariable::new(1, &[Condition::function_key(0)]).unwrap(),
    );
    table.add_condition_variable(
        ConditionVariable::new(2, &[Condition::function_key(4)]).unwrap(),
    );
    table.add_rule(MappingRule::new(0, MappingAction::Deactivate));
    table.add_rule(MappingRule::new(0, MappingAction::Activate).require(1).unwrap());
    table.add_rule(
        MappingRule::new(0, MappingAction::ToggleDimmed)
            .require(2)
            .unwrap(),
    );
    let mut controller = single_function(
        LogicalFunction::new(Dimming::new(255, 60)).with_output(OutputId(1)),
        table,
    );
    let mut outputs = intensity_outputs(1);

    controller.set_function_state(0, true);
    controller.set_function_state(4, true);
    controller.tick(20, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 60);

    // no input change, no evaluation, no toggle
    controller.tick(20, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 60);

    // any change while F4 holds re-runs the pass and toggles again
    controller.set_speed(3);
    controller.tick(20, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 255);
}

#[test]
fn install_rejects_dangling_rule() {
    let mut table = MappingTable::new();
    table.add_rule(MappingRule::new(1, MappingAction::Activate));
    let mut controller = AuxController::new();
    let result = controller.install(CompiledMapping::new(
        vec![LogicalFunction::new(Steady::full())],
        table,
    ));
    assert_eq!(
        result,
        Err(CompileError::TargetOutOfRange {
            rule: 0,
            target: 1,
            function_count: 1
        })
    );
    assert!(controller.logical_functions().is_empty());
}

#[test]
fn condition_capacity_is_bounded() {
    let conditions = [Condition::function_key(1); 5];
    assert_eq!(
        ConditionVariable::new(3, &conditions),
        Err(CompileError::TooManyConditions { id: 3 })
    );
}

// ============================================================================
// Effect Parameter Tests
// ============================================================================

#[test]
fn zero_hz_strobe_runs_at_one_hz() {
    let strobe = Strobe::new(0, 50, 255);
    assert_eq!(strobe.period_ms(), 1000);
    assert_eq!(strobe.on_time_ms(), 500);
}

#[test]
fn very_fast_strobe_keeps_a_period() {
    let strobe = Strobe::new(5000, 100, 255);
    assert_eq!(strobe.period_ms(), 1);
}

#[test]
fn zero_mhz_mars_light_is_slow() {
    assert_eq!(MarsLight::new(0, 255, 0).period_ms(), 1_000_000.0);
}

#[test]
fn zero_length_fire_has_one_cell() {
    assert_eq!(Fire::new(55, 120, 0).heat().len(), 1);
}

#[test]
fn zero_fade_switches_immediately() {
    let mut table = MappingTable::new();
    table.add_rule(MappingRule::new(0, MappingAction::Activate));
    let mut controller = single_function(
        LogicalFunction::new(SoftStartStop::new(0, 0, 180)).with_output(OutputId(1)),
        table,
    );
    let mut outputs = intensity_outputs(1);
    controller.tick(1, &mut outputs).unwrap();
    assert_eq!(outputs[0].value, 180);
}

#[test]
fn soft_start_ramps_over_irregular_ticks() {
    let mut table = MappingTable::new();
    table.add_rule(MappingRule::new(0, MappingAction::Activate));
    let mut controller = single_function(
        LogicalFunction::new(SoftStartStop::new(100, 100, 200)).with_output(OutputId(1)),
        table,
    );
    let mut outputs = intensity_outputs(1);

    let mut last = 0;
    for ms in [7, 33, 1, 19, 60] {
        controller.tick(ms, &mut outputs).unwrap();
        assert!(outputs[0].value >= last);
        last = outputs[0].value;
    }
    assert_eq!(last, 200);
}
