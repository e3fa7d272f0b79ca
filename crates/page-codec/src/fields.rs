//! Leaf fields written for icons and components.
//!
//! This is the write side of the builders in [`crate::registry`]: every
//! field a builder reads comes back out under the same leaf, and `None` or
//! empty fields are left out so absent leaves decode to defaults.

use page_model::component::{
    EmbeddedCodeSpec, InstrumentSpec, MultipleChoiceSpec, PotentialSpec, Series, TextEntrySpec,
    TickLabel, ToggleSpec, ValueFormat,
};
use page_model::{Component, Frame, Icon, ModelBinding, ModelKind, ResourceRef, Rgb};
use tracing::debug;

use crate::tag::{Leaf, ValueType};

/// One element to write inside an `icon` or `component`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Field<'a> {
    Value(Leaf, String),
    /// A resource reference the encoder may copy and rewrite.
    Resource(Leaf, &'a ResourceRef),
    /// Comma separated archive list of an applet or plugin.
    Archives(&'a [ResourceRef]),
    /// State of a hosted model, written to a companion file.
    ModelState {
        index: usize,
        kind: ModelKind,
        original: Option<&'a ResourceRef>,
    },
    Series(&'a Series),
}

#[derive(Debug, Default)]
pub(crate) struct Fields<'a> {
    fields: Vec<Field<'a>>,
}

impl<'a> Fields<'a> {
    fn value(&mut self, leaf: Leaf, value: String) {
        self.fields.push(Field::Value(leaf, value));
    }

    fn text(&mut self, leaf: Leaf, value: &Option<String>) {
        if let Some(value) = value {
            self.value(leaf, value.clone());
        }
    }

    fn int(&mut self, leaf: Leaf, value: Option<i32>) {
        if let Some(value) = value {
            self.value(leaf, value.to_string());
        }
    }

    fn float(&mut self, leaf: Leaf, value: Option<f32>) {
        if let Some(value) = value {
            self.value(leaf, value.to_string());
        }
    }

    fn flag(&mut self, leaf: Leaf, value: Option<bool>) {
        if let Some(value) = value {
            self.value(leaf, value.to_string());
        }
    }

    fn color(&mut self, leaf: Leaf, value: Option<Rgb>) {
        if let Some(color) = value {
            self.value(leaf, color.to_hex());
        }
    }

    fn list(&mut self, leaf: Leaf, items: &[String]) {
        for item in items {
            self.value(leaf, item.clone());
        }
    }

    fn resource(&mut self, leaf: Leaf, value: Option<&'a ResourceRef>) {
        if let Some(reference) = value {
            self.fields.push(Field::Resource(leaf, reference));
        }
    }

    fn frame(&mut self, frame: &Frame) {
        self.int(Leaf::Width, frame.width);
        self.int(Leaf::Height, frame.height);
        self.flag(Leaf::Opaque, frame.opaque);
        self.text(Leaf::BorderType, &frame.border);
        self.color(Leaf::BgColorValue, frame.background);
    }

    fn binding(&mut self, binding: &ModelBinding) {
        if let Some(model) = binding.model {
            self.value(Leaf::Model, model.to_string());
        }
        self.text(Leaf::ModelClass, &binding.model_class);
    }

    fn value_format(&mut self, format: &ValueFormat) {
        self.text(Leaf::Format, &format.pattern);
        self.float(Leaf::Multiplier, format.multiplier);
        self.float(Leaf::Addend, format.addend);
    }

    fn toggle(&mut self, spec: &ToggleSpec) {
        self.text(Leaf::Title, &spec.title);
        self.text(Leaf::Tooltip, &spec.tooltip);
        self.text(Leaf::Switch, &spec.switch);
        self.text(Leaf::Script, &spec.script);
        self.text(Leaf::Script2, &spec.script_off);
        self.int(Leaf::Group, spec.group);
        self.binding(&spec.binding);
        self.frame(&spec.frame);
    }

    fn text_entry(&mut self, spec: &TextEntrySpec) {
        self.text(Leaf::Description, &spec.question);
        self.text(Leaf::FieldText, &spec.text);
        self.text(Leaf::Answer, &spec.answer);
        self.text(Leaf::Tooltip, &spec.tooltip);
        self.frame(&spec.frame);
    }

    fn potential(&mut self, spec: &PotentialSpec) {
        self.int(Leaf::Element, spec.element);
        self.binding(&spec.binding);
        self.frame(&spec.frame);
    }

    fn instrument(&mut self, spec: &InstrumentSpec) {
        self.float(Leaf::Minimum, spec.minimum);
        self.float(Leaf::Maximum, spec.maximum);
        self.int(Leaf::NStep, spec.ticks);
        self.int(Leaf::Mode, spec.mode);
        self.float(Leaf::Scale, spec.scale);
        self.binding(&spec.binding);
        self.frame(&spec.frame);
    }

    fn embedded_code(&mut self, spec: &'a EmbeddedCodeSpec) {
        self.text(Leaf::Code, &spec.code);
        if !spec.archives.is_empty() {
            self.fields.push(Field::Archives(&spec.archives));
        }
        for parameter in &spec.parameters {
            self.value(Leaf::Parameter, parameter.format());
        }
        self.frame(&spec.frame);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Field<'a>> {
        self.fields.iter()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Fields of an inline icon, `class` first.
pub(crate) fn icon_fields(icon: &Icon) -> Fields<'_> {
    let mut fields = Fields::default();
    fields.value(Leaf::Class, icon.type_name().to_string());
    match icon {
        Icon::Image {
            resource,
            width,
            height,
        } => {
            fields.resource(Leaf::Resource, Some(resource));
            fields.int(Leaf::Width, *width);
            fields.int(Leaf::Height, *height);
        }
        // A placeholder keeps its reference so the image can load next time.
        Icon::Placeholder { missing } => fields.resource(Leaf::Resource, Some(missing)),
        Icon::Line(line) => {
            let nonzero = |value: i32| (value != 0).then_some(value);
            fields.int(Leaf::Width, nonzero(line.width));
            fields.int(Leaf::Height, nonzero(line.height));
            fields.int(Leaf::LeftMargin, nonzero(line.margins.left));
            fields.int(Leaf::RightMargin, nonzero(line.margins.right));
            fields.int(Leaf::TopMargin, nonzero(line.margins.top));
            fields.int(Leaf::BottomMargin, nonzero(line.margins.bottom));
            fields.int(Leaf::CornerArc, nonzero(line.corner_arc));
            fields.int(Leaf::ArcWidth, nonzero(line.arc_width));
            fields.int(Leaf::ArcHeight, nonzero(line.arc_height));
            fields.flag(Leaf::Opaque, line.opaque.then_some(true));
            fields.text(Leaf::Title, &line.title);
            fields.color(Leaf::Color, line.fill);
        }
        Icon::Bullet { kind } => {
            let code = kind.code();
            fields.int(Leaf::Style, (code != 0).then_some(code));
        }
    }
    fields
}

/// Fields of a component, `class` first.
pub(crate) fn component_fields(component: &Component) -> Fields<'_> {
    let mut fields = Fields::default();
    fields.value(Leaf::Class, component.type_name().to_string());
    match component {
        Component::Button(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.text(Leaf::Action, &spec.action);
            fields.text(Leaf::Script, &spec.script);
            fields.flag(Leaf::Continuous, spec.continuous);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::CheckBox(spec) | Component::RadioButton(spec) => fields.toggle(spec),
        Component::ComboBox(spec) => {
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.list(Leaf::Item, &spec.items);
            fields.int(Leaf::SelectedIndex, spec.selected_index);
            fields.text(Leaf::Action, &spec.action);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::Slider(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.float(Leaf::Minimum, spec.minimum);
            fields.float(Leaf::Maximum, spec.maximum);
            fields.float(Leaf::Value, spec.value);
            fields.int(Leaf::NStep, spec.ticks);
            fields.int(Leaf::Orientation, spec.orientation.map(|o| o.code()));
            if !spec.labels.is_empty() {
                fields.value(Leaf::LabelTable, TickLabel::format_table(&spec.labels));
            }
            fields.flag(Leaf::PaintTicks, spec.paint_ticks);
            fields.flag(Leaf::PaintLabels, spec.paint_labels);
            fields.text(Leaf::Property, &spec.property);
            fields.text(Leaf::Script, &spec.script);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::Spinner(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.float(Leaf::Minimum, spec.minimum);
            fields.float(Leaf::Maximum, spec.maximum);
            fields.float(Leaf::Value, spec.value);
            fields.float(Leaf::Step, spec.step);
            fields.text(Leaf::Property, &spec.property);
            fields.text(Leaf::Script, &spec.script);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::Table(spec) => {
            fields.int(Leaf::Row, spec.rows);
            fields.int(Leaf::Column, spec.columns);
            for cell in spec.flat_cells() {
                fields.value(Leaf::Cell, cell.to_string());
            }
            fields.flag(Leaf::Header, spec.header);
            fields.flag(Leaf::Grid, spec.grid);
            fields.color(Leaf::Color, spec.grid_color);
            fields.flag(Leaf::Editable, spec.editable);
            fields.frame(&spec.frame);
        }
        Component::TextField(spec) | Component::TextArea(spec) => fields.text_entry(spec),
        Component::TextBox(spec) => {
            fields.text(Leaf::FieldText, &spec.content);
            fields.color(Leaf::FgColor, spec.foreground);
            fields.frame(&spec.frame);
        }
        Component::MultipleChoice(spec) => {
            fields.text(Leaf::Description, &spec.question);
            fields.list(Leaf::Choice, &spec.choices);
            if !spec.answer.is_empty() {
                fields.value(Leaf::Answer, MultipleChoiceSpec::format_answer(&spec.answer));
            }
            fields.flag(Leaf::Multiple, spec.multiple);
            fields.flag(Leaf::Submit, spec.submit);
            fields.frame(&spec.frame);
        }
        Component::ImageQuestion(spec) => {
            fields.text(Leaf::Description, &spec.question);
            fields.resource(Leaf::Resource, spec.image.as_ref());
            fields.frame(&spec.frame);
        }
        Component::NumericBox(spec) => {
            fields.text(Leaf::DataSource, &spec.data_source);
            fields.value_format(&spec.format);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::BarGraph(spec) => {
            fields.text(Leaf::DataSource, &spec.data_source);
            fields.float(Leaf::Minimum, spec.minimum);
            fields.float(Leaf::Maximum, spec.maximum);
            fields.int(Leaf::Orientation, spec.orientation.map(|o| o.code()));
            fields.value_format(&spec.format);
            fields.flag(Leaf::Average, spec.average);
            fields.int(Leaf::Sample, spec.sample);
            fields.int(Leaf::NStep, spec.ticks);
            fields.color(Leaf::FgColor, spec.foreground);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::XyGraph(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::TimeSeriesX, &spec.x_series);
            for series in &spec.series {
                fields.fields.push(Field::Series(series));
            }
            fields.text(Leaf::XLabel, &spec.x_label);
            fields.text(Leaf::YLabel, &spec.y_label);
            fields.flag(Leaf::AutoScale, spec.auto_scale);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::PotentialWell(spec) | Component::PotentialHill(spec) => fields.potential(spec),
        Component::DnaScroller(spec) => {
            fields.text(Leaf::Dna, &spec.sequence);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::ElectronicStructureViewer(spec) => {
            fields.int(Leaf::Element, spec.element);
            fields.float(Leaf::Minimum, spec.minimum);
            fields.float(Leaf::Maximum, spec.maximum);
            fields.int(Leaf::NStep, spec.ticks);
            fields.flag(Leaf::PaintTicks, spec.paint_ticks);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::DiffractionInstrument(spec) | Component::PhotonSpectrometer(spec) => {
            fields.instrument(spec);
        }
        Component::PeriodicTable(spec) => {
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::FunctionGraph(spec) => {
            fields.list(Leaf::Expression, &spec.expressions);
            fields.float(Leaf::Minimum, spec.x_min);
            fields.float(Leaf::Maximum, spec.x_max);
            fields.float(Leaf::YMin, spec.y_min);
            fields.float(Leaf::YMax, spec.y_max);
            fields.frame(&spec.frame);
        }
        Component::ModelCanvas(spec) => {
            fields.fields.push(Field::ModelState {
                index: spec.index,
                kind: spec.kind,
                original: spec.state.as_ref(),
            });
            fields.flag(Leaf::Menubar, spec.menubar);
            fields.flag(Leaf::Statusbar, spec.statusbar);
            fields.flag(Leaf::Recorder, spec.recorder);
            fields.frame(&spec.frame);
        }
        Component::MolecularViewer3D(spec) => {
            fields.fields.push(Field::ModelState {
                index: spec.index,
                kind: ModelKind::Molecular3D,
                original: spec.structure.as_ref(),
            });
            fields.text(Leaf::Script, &spec.script);
            fields.flag(Leaf::Navigation, spec.navigation);
            fields.flag(Leaf::Spin, spec.spin);
            fields.frame(&spec.frame);
        }
        Component::Model3DCanvas(spec) => {
            fields.fields.push(Field::ModelState {
                index: spec.index,
                kind: ModelKind::Particle3D,
                original: spec.state.as_ref(),
            });
            fields.flag(Leaf::Menubar, spec.menubar);
            fields.frame(&spec.frame);
        }
        Component::Applet(spec) | Component::Plugin(spec) => fields.embedded_code(spec),
        Component::AudioPlayer(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.resource(Leaf::Resource, spec.clip.as_ref());
            fields.frame(&spec.frame);
        }
        Component::ActivityButton(spec) => {
            fields.text(Leaf::Title, &spec.title);
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.text(Leaf::Action, &spec.action);
            fields.text(Leaf::Script, &spec.script);
            // Navigation targets are pages, not files to copy.
            fields.text(
                Leaf::Resource,
                &spec.target.as_ref().map(ToString::to_string),
            );
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::ScriptConsole(spec) => {
            fields.text(Leaf::Prompt, &spec.prompt);
            fields.binding(&spec.binding);
            fields.frame(&spec.frame);
        }
        Component::IconWrapper(spec) => {
            fields.resource(Leaf::Resource, spec.image.as_ref());
            fields.text(Leaf::Tooltip, &spec.tooltip);
            fields.frame(&spec.frame);
        }
        Component::Dynamic(dynamic) => {
            for (name, value) in dynamic.current_properties() {
                match Leaf::from_name(&name) {
                    Some(Leaf::Class) => {}
                    Some(leaf) if leaf.value_type() == ValueType::TextList => {
                        for item in value.split('\n') {
                            fields.value(leaf, item.to_string());
                        }
                    }
                    Some(Leaf::TimeSeriesY) | None => {
                        debug!(
                            type_name = %dynamic.type_name,
                            property = %name,
                            "property has no leaf; not written"
                        );
                    }
                    Some(leaf) => fields.value(leaf, value),
                }
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use page_model::component::{SliderSpec, XyGraphSpec};

    use super::*;

    fn leaves(fields: &Fields<'_>) -> Vec<Leaf> {
        fields
            .iter()
            .filter_map(|field| match field {
                Field::Value(leaf, _) | Field::Resource(leaf, _) => Some(*leaf),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unset_fields_are_not_written() {
        let slider = Component::Slider(SliderSpec {
            maximum: Some(10.0),
            ..SliderSpec::default()
        });
        let fields = component_fields(&slider);
        assert_eq!(leaves(&fields), vec![Leaf::Class, Leaf::Maximum]);
        assert!(fields.iter().any(|f| *f == Field::Value(Leaf::Maximum, "10".into())));
    }

    #[test]
    fn graph_series_are_separate_fields() {
        let graph = Component::XyGraph(XyGraphSpec {
            series: vec![Series {
                ordinal: 2,
                source: "kinetic".into(),
                ..Series::default()
            }],
            ..XyGraphSpec::default()
        });
        let fields = component_fields(&graph);
        assert_eq!(fields.len(), 2);
        assert!(matches!(fields.iter().nth(1), Some(Field::Series(series)) if series.ordinal == 2));
    }

    #[test]
    fn placeholder_icons_keep_their_reference() {
        let icon = Icon::Placeholder {
            missing: ResourceRef::new("gone.png"),
        };
        let fields = icon_fields(&icon);
        assert_eq!(leaves(&fields), vec![Leaf::Class, Leaf::Resource]);
    }
}
