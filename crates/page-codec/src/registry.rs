//! Type name to component builder dispatch.
//!
//! Every known component type has a [`ComponentBuilder`] naming the scratch
//! slots it reads. Type names outside the table can be registered as dynamic
//! widget factories; anything else is skipped by the decoder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use page_model::component::{
    ActivityButtonSpec, AudioPlayerSpec, BarGraphSpec, ButtonSpec, ComboBoxSpec,
    DnaScrollerSpec, DynamicComponent, DynamicWidget, ElectronicStructureSpec, EmbeddedCodeSpec,
    FunctionGraphSpec, IconWrapperSpec, ImageQuestionSpec, InstrumentSpec, Model3DCanvasSpec,
    ModelCanvasSpec, MolecularViewerSpec, MultipleChoiceSpec, NumericBoxSpec, Orientation,
    Parameter, PeriodicTableSpec, PotentialSpec, ScriptConsoleSpec, SliderSpec, SpinnerSpec,
    TableSpec, TextBoxSpec, TextEntrySpec, TickLabel, ToggleSpec, ValueFormat, XyGraphSpec,
};
use page_model::{Component, ComponentKind, Frame, ModelBinding, ModelKind};
use tracing::debug;

use crate::scratch::{ScratchView, slots};
use crate::tag::Leaf;

/// Builds a component from the slots declared next to it.
pub type BuildFn = fn(&ScratchView<'_>) -> Component;

/// Zero-argument constructor of a dynamic widget.
pub type WidgetFactory = Arc<dyn Fn() -> Box<dyn DynamicWidget> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ComponentBuilder {
    pub type_name: &'static str,
    /// Slots read by `build` and reset after it runs.
    pub slots: &'static [Leaf],
    pub build: BuildFn,
}

/// Expands to a slot list starting with the leaves every component shares.
macro_rules! slot_set {
    (binding; $($leaf:ident),* $(,)?) => {
        &[
            Leaf::Class, Leaf::Width, Leaf::Height, Leaf::Opaque, Leaf::BorderType,
            Leaf::BgColorValue, Leaf::Model, Leaf::ModelClass, $(Leaf::$leaf),*
        ]
    };
    ($($leaf:ident),* $(,)?) => {
        &[
            Leaf::Class, Leaf::Width, Leaf::Height, Leaf::Opaque, Leaf::BorderType,
            Leaf::BgColorValue, $(Leaf::$leaf),*
        ]
    };
}

const BUTTON: &[Leaf] = slot_set!(binding; Title, Tooltip, Action, Script, Continuous);
const TOGGLE: &[Leaf] = slot_set!(binding; Title, Tooltip, Switch, Script, Script2, Group);
const COMBO_BOX: &[Leaf] = slot_set!(binding; Tooltip, Item, SelectedIndex, Action);
const SLIDER: &[Leaf] = slot_set!(binding;
    Title, Tooltip, Minimum, Maximum, Value, NStep, Orientation, LabelTable, PaintTicks,
    PaintLabels, Property, Script,
);
const SPINNER: &[Leaf] = slot_set!(binding;
    Title, Tooltip, Minimum, Maximum, Value, Step, Property, Script,
);
const TABLE: &[Leaf] = slot_set!(Row, Column, Cell, Header, Grid, Color, Editable);
const TEXT_ENTRY: &[Leaf] = slot_set!(Description, FieldText, Answer, Tooltip);
const TEXT_BOX: &[Leaf] = slot_set!(FieldText, FgColor);
const MULTIPLE_CHOICE: &[Leaf] = slot_set!(Description, Choice, Answer, Multiple, Submit);
const IMAGE_QUESTION: &[Leaf] = slot_set!(Description, Resource);
const NUMERIC_BOX: &[Leaf] = slot_set!(binding; DataSource, Format, Multiplier, Addend, Tooltip);
const BAR_GRAPH: &[Leaf] = slot_set!(binding;
    DataSource, Minimum, Maximum, Orientation, Format, Multiplier, Addend, Average, Sample,
    NStep, FgColor,
);
const XY_GRAPH: &[Leaf] = slot_set!(binding;
    Title, TimeSeriesX, TimeSeriesY, XLabel, YLabel, AutoScale,
);
const POTENTIAL: &[Leaf] = slot_set!(binding; Element);
const DNA_SCROLLER: &[Leaf] = slot_set!(binding; Dna);
const ELECTRONIC_STRUCTURE: &[Leaf] = slot_set!(binding;
    Element, Minimum, Maximum, NStep, PaintTicks,
);
const INSTRUMENT: &[Leaf] = slot_set!(binding; Minimum, Maximum, NStep, Mode, Scale);
const PERIODIC_TABLE: &[Leaf] = slot_set!(binding;);
const FUNCTION_GRAPH: &[Leaf] = slot_set!(Expression, Minimum, Maximum, YMin, YMax);
const MODEL_CANVAS: &[Leaf] = slot_set!(Resource, Menubar, Statusbar, Recorder);
const MOLECULAR_VIEWER: &[Leaf] = slot_set!(Resource, Script, Navigation, Spin);
const MODEL_3D_CANVAS: &[Leaf] = slot_set!(Resource, Menubar);
const EMBEDDED_CODE: &[Leaf] = slot_set!(Code, Resource, Parameter);
const AUDIO_PLAYER: &[Leaf] = slot_set!(Title, Tooltip, Resource);
const ACTIVITY_BUTTON: &[Leaf] = slot_set!(binding; Title, Tooltip, Action, Script, Resource);
const SCRIPT_CONSOLE: &[Leaf] = slot_set!(binding; Prompt);
const ICON_WRAPPER: &[Leaf] = slot_set!(Resource, Tooltip);

fn frame(view: &ScratchView<'_>) -> Frame {
    Frame {
        width: view.int(Leaf::Width),
        height: view.int(Leaf::Height),
        opaque: view.flag(Leaf::Opaque),
        border: view.text(Leaf::BorderType),
        background: view.color(Leaf::BgColorValue),
    }
}

fn binding(view: &ScratchView<'_>) -> ModelBinding {
    ModelBinding {
        model: view.index(Leaf::Model),
        model_class: view.text(Leaf::ModelClass),
    }
}

fn orientation(view: &ScratchView<'_>) -> Option<Orientation> {
    view.int(Leaf::Orientation).and_then(Orientation::from_code)
}

fn value_format(view: &ScratchView<'_>) -> ValueFormat {
    ValueFormat {
        pattern: view.text(Leaf::Format),
        multiplier: view.float(Leaf::Multiplier),
        addend: view.float(Leaf::Addend),
    }
}

fn build_button(view: &ScratchView<'_>) -> Component {
    Component::Button(ButtonSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        action: view.text(Leaf::Action),
        script: view.text(Leaf::Script),
        continuous: view.flag(Leaf::Continuous),
        binding: binding(view),
        frame: frame(view),
    })
}

fn toggle(view: &ScratchView<'_>) -> ToggleSpec {
    ToggleSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        switch: view.text(Leaf::Switch),
        script: view.text(Leaf::Script),
        script_off: view.text(Leaf::Script2),
        group: view.int(Leaf::Group),
        selected: None,
        binding: binding(view),
        frame: frame(view),
    }
}

fn build_check_box(view: &ScratchView<'_>) -> Component {
    Component::CheckBox(toggle(view))
}

fn build_radio_button(view: &ScratchView<'_>) -> Component {
    Component::RadioButton(toggle(view))
}

fn build_combo_box(view: &ScratchView<'_>) -> Component {
    Component::ComboBox(ComboBoxSpec {
        tooltip: view.text(Leaf::Tooltip),
        items: view.list(Leaf::Item),
        selected_index: view.int(Leaf::SelectedIndex),
        action: view.text(Leaf::Action),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_slider(view: &ScratchView<'_>) -> Component {
    Component::Slider(SliderSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        minimum: view.float(Leaf::Minimum),
        maximum: view.float(Leaf::Maximum),
        value: view.float(Leaf::Value),
        ticks: view.int(Leaf::NStep),
        orientation: orientation(view),
        labels: view
            .text(Leaf::LabelTable)
            .map(|table| TickLabel::parse_table(&table))
            .unwrap_or_default(),
        paint_ticks: view.flag(Leaf::PaintTicks),
        paint_labels: view.flag(Leaf::PaintLabels),
        property: view.text(Leaf::Property),
        script: view.text(Leaf::Script),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_spinner(view: &ScratchView<'_>) -> Component {
    Component::Spinner(SpinnerSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        minimum: view.float(Leaf::Minimum),
        maximum: view.float(Leaf::Maximum),
        value: view.float(Leaf::Value),
        step: view.float(Leaf::Step),
        property: view.text(Leaf::Property),
        script: view.text(Leaf::Script),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_table(view: &ScratchView<'_>) -> Component {
    let columns = view.int(Leaf::Column);
    Component::Table(TableSpec {
        rows: view.int(Leaf::Row),
        columns,
        cells: TableSpec::grid_from_flat(view.list(Leaf::Cell), columns),
        header: view.flag(Leaf::Header),
        grid: view.flag(Leaf::Grid),
        grid_color: view.color(Leaf::Color),
        editable: view.flag(Leaf::Editable),
        frame: frame(view),
    })
}

fn text_entry(view: &ScratchView<'_>) -> TextEntrySpec {
    TextEntrySpec {
        question: view.text(Leaf::Description),
        text: view.text(Leaf::FieldText),
        answer: view.text(Leaf::Answer),
        tooltip: view.text(Leaf::Tooltip),
        frame: frame(view),
    }
}

fn build_text_field(view: &ScratchView<'_>) -> Component {
    Component::TextField(text_entry(view))
}

fn build_text_area(view: &ScratchView<'_>) -> Component {
    Component::TextArea(text_entry(view))
}

fn build_text_box(view: &ScratchView<'_>) -> Component {
    Component::TextBox(TextBoxSpec {
        content: view.text(Leaf::FieldText),
        foreground: view.color(Leaf::FgColor),
        frame: frame(view),
    })
}

fn build_multiple_choice(view: &ScratchView<'_>) -> Component {
    Component::MultipleChoice(MultipleChoiceSpec {
        question: view.text(Leaf::Description),
        choices: view.list(Leaf::Choice),
        answer: view
            .text(Leaf::Answer)
            .map(|answer| MultipleChoiceSpec::parse_answer(&answer))
            .unwrap_or_default(),
        multiple: view.flag(Leaf::Multiple),
        submit: view.flag(Leaf::Submit),
        frame: frame(view),
    })
}

fn build_image_question(view: &ScratchView<'_>) -> Component {
    Component::ImageQuestion(ImageQuestionSpec {
        question: view.text(Leaf::Description),
        image: view.resource(Leaf::Resource),
        image_missing: false,
        frame: frame(view),
    })
}

fn build_numeric_box(view: &ScratchView<'_>) -> Component {
    Component::NumericBox(NumericBoxSpec {
        data_source: view.text(Leaf::DataSource),
        format: value_format(view),
        tooltip: view.text(Leaf::Tooltip),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_bar_graph(view: &ScratchView<'_>) -> Component {
    Component::BarGraph(BarGraphSpec {
        data_source: view.text(Leaf::DataSource),
        minimum: view.float(Leaf::Minimum),
        maximum: view.float(Leaf::Maximum),
        orientation: orientation(view),
        format: value_format(view),
        average: view.flag(Leaf::Average),
        sample: view.int(Leaf::Sample),
        ticks: view.int(Leaf::NStep),
        foreground: view.color(Leaf::FgColor),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_xy_graph(view: &ScratchView<'_>) -> Component {
    let mut series = view.series();
    series.sort_by_key(|series| series.ordinal);
    Component::XyGraph(XyGraphSpec {
        title: view.text(Leaf::Title),
        x_series: view.text(Leaf::TimeSeriesX),
        series,
        x_label: view.text(Leaf::XLabel),
        y_label: view.text(Leaf::YLabel),
        auto_scale: view.flag(Leaf::AutoScale),
        binding: binding(view),
        frame: frame(view),
    })
}

fn potential(view: &ScratchView<'_>) -> PotentialSpec {
    PotentialSpec {
        element: view.int(Leaf::Element),
        binding: binding(view),
        frame: frame(view),
    }
}

fn build_potential_well(view: &ScratchView<'_>) -> Component {
    Component::PotentialWell(potential(view))
}

fn build_potential_hill(view: &ScratchView<'_>) -> Component {
    Component::PotentialHill(potential(view))
}

fn build_dna_scroller(view: &ScratchView<'_>) -> Component {
    Component::DnaScroller(DnaScrollerSpec {
        sequence: view.text(Leaf::Dna),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_electronic_structure(view: &ScratchView<'_>) -> Component {
    Component::ElectronicStructureViewer(ElectronicStructureSpec {
        element: view.int(Leaf::Element),
        minimum: view.float(Leaf::Minimum),
        maximum: view.float(Leaf::Maximum),
        ticks: view.int(Leaf::NStep),
        paint_ticks: view.flag(Leaf::PaintTicks),
        binding: binding(view),
        frame: frame(view),
    })
}

fn instrument(view: &ScratchView<'_>) -> InstrumentSpec {
    InstrumentSpec {
        minimum: view.float(Leaf::Minimum),
        maximum: view.float(Leaf::Maximum),
        ticks: view.int(Leaf::NStep),
        mode: view.int(Leaf::Mode),
        scale: view.float(Leaf::Scale),
        binding: binding(view),
        frame: frame(view),
    }
}

fn build_diffraction(view: &ScratchView<'_>) -> Component {
    Component::DiffractionInstrument(instrument(view))
}

fn build_photon_spectrometer(view: &ScratchView<'_>) -> Component {
    Component::PhotonSpectrometer(instrument(view))
}

fn build_periodic_table(view: &ScratchView<'_>) -> Component {
    Component::PeriodicTable(PeriodicTableSpec {
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_function_graph(view: &ScratchView<'_>) -> Component {
    Component::FunctionGraph(FunctionGraphSpec {
        expressions: view.list(Leaf::Expression),
        x_min: view.float(Leaf::Minimum),
        x_max: view.float(Leaf::Maximum),
        y_min: view.float(Leaf::YMin),
        y_max: view.float(Leaf::YMax),
        frame: frame(view),
    })
}

fn model_canvas(view: &ScratchView<'_>, kind: ModelKind) -> Component {
    Component::ModelCanvas(ModelCanvasSpec {
        state: view.resource(Leaf::Resource),
        menubar: view.flag(Leaf::Menubar),
        statusbar: view.flag(Leaf::Statusbar),
        recorder: view.flag(Leaf::Recorder),
        frame: frame(view),
        ..ModelCanvasSpec::new(kind)
    })
}

fn build_atom_canvas(view: &ScratchView<'_>) -> Component {
    model_canvas(view, ModelKind::Atomic)
}

fn build_chem_canvas(view: &ScratchView<'_>) -> Component {
    model_canvas(view, ModelKind::Chemical)
}

fn build_gb_canvas(view: &ScratchView<'_>) -> Component {
    model_canvas(view, ModelKind::GayBerne)
}

fn build_molecular_viewer(view: &ScratchView<'_>) -> Component {
    Component::MolecularViewer3D(MolecularViewerSpec {
        index: 0,
        structure: view.resource(Leaf::Resource),
        script: view.text(Leaf::Script),
        navigation: view.flag(Leaf::Navigation),
        spin: view.flag(Leaf::Spin),
        frame: frame(view),
    })
}

fn build_model_3d_canvas(view: &ScratchView<'_>) -> Component {
    Component::Model3DCanvas(Model3DCanvasSpec {
        index: 0,
        state: view.resource(Leaf::Resource),
        menubar: view.flag(Leaf::Menubar),
        frame: frame(view),
    })
}

fn embedded_code(view: &ScratchView<'_>) -> EmbeddedCodeSpec {
    EmbeddedCodeSpec {
        code: view.text(Leaf::Code),
        archives: view
            .text(Leaf::Resource)
            .map(|list| EmbeddedCodeSpec::parse_archives(&list))
            .unwrap_or_default(),
        parameters: view
            .list(Leaf::Parameter)
            .iter()
            .filter_map(|text| Parameter::parse(text))
            .collect(),
        frame: frame(view),
    }
}

fn build_applet(view: &ScratchView<'_>) -> Component {
    Component::Applet(embedded_code(view))
}

fn build_plugin(view: &ScratchView<'_>) -> Component {
    Component::Plugin(embedded_code(view))
}

fn build_audio_player(view: &ScratchView<'_>) -> Component {
    Component::AudioPlayer(AudioPlayerSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        clip: view.resource(Leaf::Resource),
        frame: frame(view),
    })
}

fn build_activity_button(view: &ScratchView<'_>) -> Component {
    Component::ActivityButton(ActivityButtonSpec {
        title: view.text(Leaf::Title),
        tooltip: view.text(Leaf::Tooltip),
        action: view.text(Leaf::Action),
        script: view.text(Leaf::Script),
        target: view.resource(Leaf::Resource),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_script_console(view: &ScratchView<'_>) -> Component {
    Component::ScriptConsole(ScriptConsoleSpec {
        prompt: view.text(Leaf::Prompt),
        binding: binding(view),
        frame: frame(view),
    })
}

fn build_icon_wrapper(view: &ScratchView<'_>) -> Component {
    Component::IconWrapper(IconWrapperSpec {
        image: view.resource(Leaf::Resource),
        image_missing: false,
        tooltip: view.text(Leaf::Tooltip),
        frame: frame(view),
    })
}

/// Slot set and builder for each known component kind.
fn standard_builder(kind: ComponentKind) -> (&'static [Leaf], BuildFn) {
    match kind {
        ComponentKind::Button => (BUTTON, build_button),
        ComponentKind::CheckBox => (TOGGLE, build_check_box),
        ComponentKind::RadioButton => (TOGGLE, build_radio_button),
        ComponentKind::ComboBox => (COMBO_BOX, build_combo_box),
        ComponentKind::Slider => (SLIDER, build_slider),
        ComponentKind::Spinner => (SPINNER, build_spinner),
        ComponentKind::Table => (TABLE, build_table),
        ComponentKind::TextField => (TEXT_ENTRY, build_text_field),
        ComponentKind::TextArea => (TEXT_ENTRY, build_text_area),
        ComponentKind::TextBox => (TEXT_BOX, build_text_box),
        ComponentKind::MultipleChoice => (MULTIPLE_CHOICE, build_multiple_choice),
        ComponentKind::ImageQuestion => (IMAGE_QUESTION, build_image_question),
        ComponentKind::NumericBox => (NUMERIC_BOX, build_numeric_box),
        ComponentKind::BarGraph => (BAR_GRAPH, build_bar_graph),
        ComponentKind::XyGraph => (XY_GRAPH, build_xy_graph),
        ComponentKind::PotentialWell => (POTENTIAL, build_potential_well),
        ComponentKind::PotentialHill => (POTENTIAL, build_potential_hill),
        ComponentKind::DnaScroller => (DNA_SCROLLER, build_dna_scroller),
        ComponentKind::ElectronicStructureViewer => {
            (ELECTRONIC_STRUCTURE, build_electronic_structure)
        }
        ComponentKind::DiffractionInstrument => (INSTRUMENT, build_diffraction),
        ComponentKind::PhotonSpectrometer => (INSTRUMENT, build_photon_spectrometer),
        ComponentKind::PeriodicTable => (PERIODIC_TABLE, build_periodic_table),
        ComponentKind::FunctionGraph => (FUNCTION_GRAPH, build_function_graph),
        ComponentKind::AtomModelCanvas => (MODEL_CANVAS, build_atom_canvas),
        ComponentKind::ChemModelCanvas => (MODEL_CANVAS, build_chem_canvas),
        ComponentKind::GbModelCanvas => (MODEL_CANVAS, build_gb_canvas),
        ComponentKind::MolecularViewer3D => (MOLECULAR_VIEWER, build_molecular_viewer),
        ComponentKind::Model3DCanvas => (MODEL_3D_CANVAS, build_model_3d_canvas),
        ComponentKind::Applet => (EMBEDDED_CODE, build_applet),
        ComponentKind::Plugin => (EMBEDDED_CODE, build_plugin),
        ComponentKind::AudioPlayer => (AUDIO_PLAYER, build_audio_player),
        ComponentKind::ActivityButton => (ACTIVITY_BUTTON, build_activity_button),
        ComponentKind::ScriptConsole => (SCRIPT_CONSOLE, build_script_console),
        ComponentKind::IconWrapper => (ICON_WRAPPER, build_icon_wrapper),
    }
}

/// Maps component type names to builders.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    builders: BTreeMap<String, ComponentBuilder>,
    dynamic: BTreeMap<String, WidgetFactory>,
}

impl ComponentRegistry {
    /// An empty registry; every component type name is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a builder for every [`ComponentKind`].
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in ComponentKind::ALL {
            let (slots, build) = standard_builder(kind);
            registry.register(ComponentBuilder {
                type_name: kind.type_name(),
                slots,
                build,
            });
        }
        registry
    }

    pub fn register(&mut self, builder: ComponentBuilder) {
        self.builders.insert(builder.type_name.to_string(), builder);
    }

    /// Register a constructor for a type name outside the standard table.
    pub fn register_dynamic<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn DynamicWidget> + Send + Sync + 'static,
    {
        self.dynamic.insert(type_name.into(), Arc::new(factory));
    }

    #[must_use]
    pub fn builder(&self, type_name: &str) -> Option<&ComponentBuilder> {
        self.builders.get(type_name.trim())
    }

    #[must_use]
    pub fn has_dynamic(&self, type_name: &str) -> bool {
        self.dynamic.contains_key(type_name.trim())
    }

    /// Construct a dynamic widget and initialize it with the page's properties.
    ///
    /// Returns `None` when no factory is registered or the widget reports it
    /// cannot be embedded.
    #[must_use]
    pub fn construct_dynamic(
        &self,
        type_name: &str,
        properties: BTreeMap<String, String>,
    ) -> Option<DynamicComponent> {
        let factory = self.dynamic.get(type_name.trim())?;
        let mut widget = factory();
        widget.initialize(&properties);
        if !widget.is_embeddable() {
            debug!(type_name, "dynamic widget is not embeddable");
            return None;
        }
        Some(DynamicComponent::new(type_name.trim(), properties).with_widget(Arc::from(widget)))
    }

    /// Slots read by dynamic construction: everything an embedded element may carry.
    #[must_use]
    pub fn dynamic_slots() -> &'static [Leaf] {
        slots::embedded_scope()
    }

    /// Registered type names, static builders first.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.builders
            .keys()
            .chain(self.dynamic.keys())
            .map(String::as_str)
    }

    pub fn builders(&self) -> impl Iterator<Item = &ComponentBuilder> {
        self.builders.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len() + self.dynamic.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty() && self.dynamic.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("builders", &self.builders.len())
            .field("dynamic", &self.dynamic.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::Scratch;
    use crate::scratch::tests::{assert_consumes_exactly, fill_every_slot};

    #[derive(Debug)]
    struct Gauge {
        embeddable: bool,
    }

    impl DynamicWidget for Gauge {
        fn is_embeddable(&self) -> bool {
            self.embeddable
        }
    }

    #[test]
    fn every_builder_reads_only_its_declared_slots() {
        let registry = ComponentRegistry::standard();
        assert_eq!(registry.builders().count(), ComponentKind::ALL.len());
        for builder in registry.builders() {
            let mut scratch = Scratch::new();
            fill_every_slot(&mut scratch);
            let component = scratch.consume(builder.slots, |view| (builder.build)(view));
            assert_eq!(component.type_name(), builder.type_name);
            assert_consumes_exactly(builder.slots);
        }
    }

    #[test]
    fn builders_leave_unset_fields_at_defaults() {
        let registry = ComponentRegistry::standard();
        let builder = registry.builder("page.widget.Slider").unwrap();
        let mut scratch = Scratch::new();
        scratch.store(Leaf::Class, "page.widget.Slider").unwrap();
        scratch.store(Leaf::Maximum, "10").unwrap();
        let component = scratch.consume(builder.slots, |view| (builder.build)(view));
        let Component::Slider(slider) = component else {
            panic!("expected a slider");
        };
        assert_eq!(slider.maximum, Some(10.0));
        assert_eq!(
            slider,
            SliderSpec {
                maximum: Some(10.0),
                ..SliderSpec::default()
            }
        );
    }

    #[test]
    fn dynamic_factories_honor_embeddability() {
        let mut registry = ComponentRegistry::standard();
        registry.register_dynamic("lab.Gauge", || Box::new(Gauge { embeddable: true }));
        registry.register_dynamic("lab.Hidden", || Box::new(Gauge { embeddable: false }));
        let properties = BTreeMap::from([("title".to_string(), "Pressure".to_string())]);
        let gauge = registry
            .construct_dynamic("lab.Gauge", properties.clone())
            .unwrap();
        assert_eq!(gauge.type_name, "lab.Gauge");
        assert!(gauge.widget.is_some());
        assert!(registry.construct_dynamic("lab.Hidden", properties.clone()).is_none());
        assert!(registry.construct_dynamic("lab.Missing", properties).is_none());
    }

    #[test]
    fn table_cells_fill_rows() {
        let registry = ComponentRegistry::standard();
        let builder = registry.builder("page.widget.Table").unwrap();
        let mut scratch = Scratch::new();
        for cell in ["a", "b", "c", "d"] {
            scratch.store(Leaf::Cell, cell).unwrap();
        }
        scratch.store(Leaf::Column, "2").unwrap();
        let Component::Table(table) = scratch.consume(builder.slots, |view| (builder.build)(view))
        else {
            panic!("expected a table");
        };
        assert_eq!(table.cells.len(), 2);
        assert_eq!(table.cells[1], vec!["c".to_string(), "d".to_string()]);
    }
}
