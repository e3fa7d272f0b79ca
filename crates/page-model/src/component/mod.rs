//! The closed set of embeddable components.
//!
//! Each variant carries only the fields meaningful to it. Optional fields are
//! sparse in the same way as [`AttributeBag`](crate::AttributeBag): `None`
//! means the widget's own default applies.

mod controls;
mod dynamic;
mod graphs;
mod hosts;
mod instruments;
mod questions;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::links::LinkKind;
use crate::resource::ResourceRef;

pub use controls::{
    ActivityButtonSpec, ButtonSpec, ComboBoxSpec, ScriptConsoleSpec, SliderSpec, SpinnerSpec,
    TickLabel, ToggleSpec,
};
pub use dynamic::{DynamicComponent, DynamicWidget};
pub use graphs::{
    BarGraphSpec, FunctionGraphSpec, NumericBoxSpec, Series, ValueFormat, XyGraphSpec,
};
pub use hosts::{
    AudioPlayerSpec, EmbeddedCodeSpec, IconWrapperSpec, Model3DCanvasSpec, ModelCanvasSpec,
    ModelKind, MolecularViewerSpec, Parameter,
};
pub use instruments::{
    DnaScrollerSpec, ElectronicStructureSpec, InstrumentSpec, PeriodicTableSpec, PotentialSpec,
};
pub use questions::{ImageQuestionSpec, MultipleChoiceSpec, TableSpec, TextBoxSpec, TextEntrySpec};

/// Index into a document's component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub usize);

/// Size and decoration shared by every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub opaque: Option<bool>,
    /// Border style name, e.g. `Lowered Etched`.
    pub border: Option<String>,
    pub background: Option<Rgb>,
}

impl Frame {
    #[must_use]
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// Which model a control talks to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBinding {
    pub model: Option<usize>,
    /// Type name of the expected model component.
    pub model_class: Option<String>,
}

impl ModelBinding {
    #[must_use]
    pub fn to(model: usize) -> Self {
        Self {
            model: Some(model),
            model_class: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// What a deferred resource is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceRole {
    Image,
    Audio,
    Archive,
    ModelState,
    Structure,
    Page,
}

/// Fieldless discriminant of [`Component`], one per wire type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    CheckBox,
    RadioButton,
    ComboBox,
    Slider,
    Spinner,
    Table,
    TextField,
    TextArea,
    TextBox,
    MultipleChoice,
    ImageQuestion,
    NumericBox,
    BarGraph,
    XyGraph,
    PotentialWell,
    PotentialHill,
    DnaScroller,
    ElectronicStructureViewer,
    DiffractionInstrument,
    PhotonSpectrometer,
    PeriodicTable,
    FunctionGraph,
    AtomModelCanvas,
    ChemModelCanvas,
    GbModelCanvas,
    MolecularViewer3D,
    Model3DCanvas,
    Applet,
    Plugin,
    AudioPlayer,
    ActivityButton,
    ScriptConsole,
    IconWrapper,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 34] = [
        Self::Button,
        Self::CheckBox,
        Self::RadioButton,
        Self::ComboBox,
        Self::Slider,
        Self::Spinner,
        Self::Table,
        Self::TextField,
        Self::TextArea,
        Self::TextBox,
        Self::MultipleChoice,
        Self::ImageQuestion,
        Self::NumericBox,
        Self::BarGraph,
        Self::XyGraph,
        Self::PotentialWell,
        Self::PotentialHill,
        Self::DnaScroller,
        Self::ElectronicStructureViewer,
        Self::DiffractionInstrument,
        Self::PhotonSpectrometer,
        Self::PeriodicTable,
        Self::FunctionGraph,
        Self::AtomModelCanvas,
        Self::ChemModelCanvas,
        Self::GbModelCanvas,
        Self::MolecularViewer3D,
        Self::Model3DCanvas,
        Self::Applet,
        Self::Plugin,
        Self::AudioPlayer,
        Self::ActivityButton,
        Self::ScriptConsole,
        Self::IconWrapper,
    ];

    /// Fully qualified type name written in the `class` leaf.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Button => "page.widget.Button",
            Self::CheckBox => "page.widget.CheckBox",
            Self::RadioButton => "page.widget.RadioButton",
            Self::ComboBox => "page.widget.ComboBox",
            Self::Slider => "page.widget.Slider",
            Self::Spinner => "page.widget.Spinner",
            Self::Table => "page.widget.Table",
            Self::TextField => "page.question.TextField",
            Self::TextArea => "page.question.TextArea",
            Self::TextBox => "page.widget.TextBox",
            Self::MultipleChoice => "page.question.MultipleChoice",
            Self::ImageQuestion => "page.question.ImageQuestion",
            Self::NumericBox => "page.graph.NumericBox",
            Self::BarGraph => "page.graph.BarGraph",
            Self::XyGraph => "page.graph.XyGraph",
            Self::PotentialWell => "page.instrument.PotentialWell",
            Self::PotentialHill => "page.instrument.PotentialHill",
            Self::DnaScroller => "page.instrument.DnaScroller",
            Self::ElectronicStructureViewer => "page.instrument.ElectronicStructureViewer",
            Self::DiffractionInstrument => "page.instrument.DiffractionInstrument",
            Self::PhotonSpectrometer => "page.instrument.PhotonSpectrometer",
            Self::PeriodicTable => "page.instrument.PeriodicTable",
            Self::FunctionGraph => "page.graph.FunctionGraph",
            Self::AtomModelCanvas => "page.model.AtomContainer",
            Self::ChemModelCanvas => "page.model.ChemContainer",
            Self::GbModelCanvas => "page.model.GbContainer",
            Self::MolecularViewer3D => "page.model.MolecularViewer3D",
            Self::Model3DCanvas => "page.model.Model3DCanvas",
            Self::Applet => "page.host.Applet",
            Self::Plugin => "page.host.Plugin",
            Self::AudioPlayer => "page.media.AudioPlayer",
            Self::ActivityButton => "page.widget.ActivityButton",
            Self::ScriptConsole => "page.widget.ScriptConsole",
            Self::IconWrapper => "page.media.IconWrapper",
        }
    }

    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == name.trim())
    }
}

/// An embedded component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Button(ButtonSpec),
    CheckBox(ToggleSpec),
    RadioButton(ToggleSpec),
    ComboBox(ComboBoxSpec),
    Slider(SliderSpec),
    Spinner(SpinnerSpec),
    Table(TableSpec),
    TextField(TextEntrySpec),
    TextArea(TextEntrySpec),
    TextBox(TextBoxSpec),
    MultipleChoice(MultipleChoiceSpec),
    ImageQuestion(ImageQuestionSpec),
    NumericBox(NumericBoxSpec),
    BarGraph(BarGraphSpec),
    XyGraph(XyGraphSpec),
    PotentialWell(PotentialSpec),
    PotentialHill(PotentialSpec),
    DnaScroller(DnaScrollerSpec),
    ElectronicStructureViewer(ElectronicStructureSpec),
    DiffractionInstrument(InstrumentSpec),
    PhotonSpectrometer(InstrumentSpec),
    PeriodicTable(PeriodicTableSpec),
    FunctionGraph(FunctionGraphSpec),
    ModelCanvas(ModelCanvasSpec),
    MolecularViewer3D(MolecularViewerSpec),
    Model3DCanvas(Model3DCanvasSpec),
    Applet(EmbeddedCodeSpec),
    Plugin(EmbeddedCodeSpec),
    AudioPlayer(AudioPlayerSpec),
    ActivityButton(ActivityButtonSpec),
    ScriptConsole(ScriptConsoleSpec),
    IconWrapper(IconWrapperSpec),
    Dynamic(DynamicComponent),
}

/// A link a component asks for once its model is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub model: usize,
    pub kind: LinkKind,
    pub key: String,
}

impl Component {
    /// Discriminant; `None` for dynamic components.
    #[must_use]
    pub fn kind(&self) -> Option<ComponentKind> {
        let kind = match self {
            Self::Button(_) => ComponentKind::Button,
            Self::CheckBox(_) => ComponentKind::CheckBox,
            Self::RadioButton(_) => ComponentKind::RadioButton,
            Self::ComboBox(_) => ComponentKind::ComboBox,
            Self::Slider(_) => ComponentKind::Slider,
            Self::Spinner(_) => ComponentKind::Spinner,
            Self::Table(_) => ComponentKind::Table,
            Self::TextField(_) => ComponentKind::TextField,
            Self::TextArea(_) => ComponentKind::TextArea,
            Self::TextBox(_) => ComponentKind::TextBox,
            Self::MultipleChoice(_) => ComponentKind::MultipleChoice,
            Self::ImageQuestion(_) => ComponentKind::ImageQuestion,
            Self::NumericBox(_) => ComponentKind::NumericBox,
            Self::BarGraph(_) => ComponentKind::BarGraph,
            Self::XyGraph(_) => ComponentKind::XyGraph,
            Self::PotentialWell(_) => ComponentKind::PotentialWell,
            Self::PotentialHill(_) => ComponentKind::PotentialHill,
            Self::DnaScroller(_) => ComponentKind::DnaScroller,
            Self::ElectronicStructureViewer(_) => ComponentKind::ElectronicStructureViewer,
            Self::DiffractionInstrument(_) => ComponentKind::DiffractionInstrument,
            Self::PhotonSpectrometer(_) => ComponentKind::PhotonSpectrometer,
            Self::PeriodicTable(_) => ComponentKind::PeriodicTable,
            Self::FunctionGraph(_) => ComponentKind::FunctionGraph,
            Self::ModelCanvas(spec) => match spec.kind {
                ModelKind::Chemical => ComponentKind::ChemModelCanvas,
                ModelKind::GayBerne => ComponentKind::GbModelCanvas,
                _ => ComponentKind::AtomModelCanvas,
            },
            Self::MolecularViewer3D(_) => ComponentKind::MolecularViewer3D,
            Self::Model3DCanvas(_) => ComponentKind::Model3DCanvas,
            Self::Applet(_) => ComponentKind::Applet,
            Self::Plugin(_) => ComponentKind::Plugin,
            Self::AudioPlayer(_) => ComponentKind::AudioPlayer,
            Self::ActivityButton(_) => ComponentKind::ActivityButton,
            Self::ScriptConsole(_) => ComponentKind::ScriptConsole,
            Self::IconWrapper(_) => ComponentKind::IconWrapper,
            Self::Dynamic(_) => return None,
        };
        Some(kind)
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Dynamic(dynamic) => &dynamic.type_name,
            other => other
                .kind()
                .map_or("page.widget.Unknown", ComponentKind::type_name),
        }
    }

    #[must_use]
    pub fn frame(&self) -> Option<&Frame> {
        let frame = match self {
            Self::Button(spec) => &spec.frame,
            Self::CheckBox(spec) | Self::RadioButton(spec) => &spec.frame,
            Self::ComboBox(spec) => &spec.frame,
            Self::Slider(spec) => &spec.frame,
            Self::Spinner(spec) => &spec.frame,
            Self::Table(spec) => &spec.frame,
            Self::TextField(spec) | Self::TextArea(spec) => &spec.frame,
            Self::TextBox(spec) => &spec.frame,
            Self::MultipleChoice(spec) => &spec.frame,
            Self::ImageQuestion(spec) => &spec.frame,
            Self::NumericBox(spec) => &spec.frame,
            Self::BarGraph(spec) => &spec.frame,
            Self::XyGraph(spec) => &spec.frame,
            Self::PotentialWell(spec) | Self::PotentialHill(spec) => &spec.frame,
            Self::DnaScroller(spec) => &spec.frame,
            Self::ElectronicStructureViewer(spec) => &spec.frame,
            Self::DiffractionInstrument(spec) | Self::PhotonSpectrometer(spec) => &spec.frame,
            Self::PeriodicTable(spec) => &spec.frame,
            Self::FunctionGraph(spec) => &spec.frame,
            Self::ModelCanvas(spec) => &spec.frame,
            Self::MolecularViewer3D(spec) => &spec.frame,
            Self::Model3DCanvas(spec) => &spec.frame,
            Self::Applet(spec) | Self::Plugin(spec) => &spec.frame,
            Self::AudioPlayer(spec) => &spec.frame,
            Self::ActivityButton(spec) => &spec.frame,
            Self::ScriptConsole(spec) => &spec.frame,
            Self::IconWrapper(spec) => &spec.frame,
            Self::Dynamic(_) => return None,
        };
        Some(frame)
    }

    #[must_use]
    pub fn binding(&self) -> Option<&ModelBinding> {
        match self {
            Self::Button(spec) => Some(&spec.binding),
            Self::CheckBox(spec) | Self::RadioButton(spec) => Some(&spec.binding),
            Self::ComboBox(spec) => Some(&spec.binding),
            Self::Slider(spec) => Some(&spec.binding),
            Self::Spinner(spec) => Some(&spec.binding),
            Self::NumericBox(spec) => Some(&spec.binding),
            Self::BarGraph(spec) => Some(&spec.binding),
            Self::XyGraph(spec) => Some(&spec.binding),
            Self::PotentialWell(spec) | Self::PotentialHill(spec) => Some(&spec.binding),
            Self::DnaScroller(spec) => Some(&spec.binding),
            Self::ElectronicStructureViewer(spec) => Some(&spec.binding),
            Self::DiffractionInstrument(spec) | Self::PhotonSpectrometer(spec) => {
                Some(&spec.binding)
            }
            Self::PeriodicTable(spec) => Some(&spec.binding),
            Self::ActivityButton(spec) => Some(&spec.binding),
            Self::ScriptConsole(spec) => Some(&spec.binding),
            _ => None,
        }
    }

    /// The model this component hosts, for model-bearing variants.
    #[must_use]
    pub fn hosted_model(&self) -> Option<(usize, ModelKind)> {
        match self {
            Self::ModelCanvas(spec) => Some((spec.index, spec.kind)),
            Self::MolecularViewer3D(spec) => Some((spec.index, ModelKind::Molecular3D)),
            Self::Model3DCanvas(spec) => Some((spec.index, ModelKind::Particle3D)),
            _ => None,
        }
    }

    /// Assign the model index of a model-bearing component. No-op otherwise.
    pub fn set_model_index(&mut self, index: usize) {
        match self {
            Self::ModelCanvas(spec) => spec.index = index,
            Self::MolecularViewer3D(spec) => spec.index = index,
            Self::Model3DCanvas(spec) => spec.index = index,
            _ => {}
        }
    }

    /// Links to request from the bound model once it is loaded.
    #[must_use]
    pub fn link_requests(&self) -> Vec<LinkRequest> {
        let Some(model) = self.binding().and_then(|binding| binding.model) else {
            return Vec::new();
        };
        let request = |kind: LinkKind, key: &str| LinkRequest {
            model,
            kind,
            key: key.to_string(),
        };
        let keyed = |kind: LinkKind, key: &Option<String>| {
            key.as_deref()
                .map(|key| request(kind, key))
                .into_iter()
                .collect::<Vec<_>>()
        };
        match self {
            Self::Button(spec) => match (&spec.action, &spec.script) {
                (Some(action), _) => vec![request(LinkKind::Action, action)],
                (None, Some(script)) => vec![request(LinkKind::Script, script)],
                (None, None) => Vec::new(),
            },
            Self::CheckBox(spec) | Self::RadioButton(spec) => keyed(LinkKind::Switch, &spec.switch),
            Self::ComboBox(spec) => keyed(LinkKind::Choice, &spec.action),
            Self::Slider(spec) => keyed(LinkKind::Property, &spec.property),
            Self::Spinner(spec) => keyed(LinkKind::Property, &spec.property),
            Self::NumericBox(spec) => keyed(LinkKind::DataSource, &spec.data_source),
            Self::BarGraph(spec) => keyed(LinkKind::DataSource, &spec.data_source),
            Self::XyGraph(spec) => spec
                .x_series
                .iter()
                .chain(spec.series.iter().map(|series| &series.source))
                .map(|source| request(LinkKind::DataSource, source))
                .collect(),
            Self::PotentialWell(_) | Self::PotentialHill(_) => {
                vec![request(LinkKind::Observer, "potential")]
            }
            Self::DnaScroller(_) => vec![request(LinkKind::Observer, "dna")],
            Self::ElectronicStructureViewer(_) => {
                vec![request(LinkKind::Observer, "energy-levels")]
            }
            Self::DiffractionInstrument(_) => vec![request(LinkKind::Observer, "diffraction")],
            Self::PhotonSpectrometer(_) => vec![request(LinkKind::Observer, "photons")],
            Self::PeriodicTable(_) => vec![request(LinkKind::Observer, "elements")],
            Self::ActivityButton(spec) => keyed(LinkKind::Action, &spec.action),
            Self::ScriptConsole(_) => vec![request(LinkKind::Script, "console")],
            _ => Vec::new(),
        }
    }

    /// Resources to fetch after parsing.
    #[must_use]
    pub fn resources(&self) -> Vec<(ResourceRole, &ResourceRef)> {
        match self {
            Self::ImageQuestion(spec) => optional(ResourceRole::Image, spec.image.as_ref()),
            Self::IconWrapper(spec) => optional(ResourceRole::Image, spec.image.as_ref()),
            Self::AudioPlayer(spec) => optional(ResourceRole::Audio, spec.clip.as_ref()),
            Self::ActivityButton(spec) => optional(ResourceRole::Page, spec.target.as_ref()),
            Self::ModelCanvas(spec) => optional(ResourceRole::ModelState, spec.state.as_ref()),
            Self::Model3DCanvas(spec) => optional(ResourceRole::ModelState, spec.state.as_ref()),
            Self::MolecularViewer3D(spec) => {
                optional(ResourceRole::Structure, spec.structure.as_ref())
            }
            Self::Applet(spec) | Self::Plugin(spec) => spec
                .archives
                .iter()
                .map(|archive| (ResourceRole::Archive, archive))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Flag the component's image as unloadable so it renders a placeholder.
    ///
    /// Returns `false` for components that carry no image.
    pub fn mark_image_missing(&mut self) -> bool {
        match self {
            Self::ImageQuestion(ImageQuestionSpec { image_missing, .. })
            | Self::IconWrapper(IconWrapperSpec { image_missing, .. }) => {
                *image_missing = true;
                true
            }
            _ => false,
        }
    }

    /// Convenience controls are rebuilt by the editor rather than saved.
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        !matches!(self, Self::ScriptConsole(_))
    }
}

fn optional(
    role: ResourceRole,
    resource: Option<&ResourceRef>,
) -> Vec<(ResourceRole, &ResourceRef)> {
    resource.map(|resource| (role, resource)).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_unique_and_resolvable() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_type_name(kind.type_name()), Some(kind));
        }
        let mut names: Vec<_> = ComponentKind::ALL.iter().map(|k| k.type_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ComponentKind::ALL.len());
    }

    #[test]
    fn model_canvas_kind_follows_engine() {
        let canvas = Component::ModelCanvas(ModelCanvasSpec::new(ModelKind::GayBerne));
        assert_eq!(canvas.kind(), Some(ComponentKind::GbModelCanvas));
        assert_eq!(canvas.hosted_model(), Some((0, ModelKind::GayBerne)));
    }

    #[test]
    fn unbound_controls_request_nothing() {
        let slider = Component::Slider(SliderSpec {
            property: Some("temperature".into()),
            ..SliderSpec::default()
        });
        assert!(slider.link_requests().is_empty());
    }

    #[test]
    fn xy_graph_requests_every_series() {
        let graph = Component::XyGraph(XyGraphSpec {
            x_series: Some("time".into()),
            series: vec![
                Series {
                    ordinal: 1,
                    source: "kinetic".into(),
                    ..Series::default()
                },
                Series {
                    ordinal: 2,
                    source: "potential".into(),
                    ..Series::default()
                },
            ],
            binding: ModelBinding::to(0),
            ..XyGraphSpec::default()
        });
        let keys: Vec<_> = graph.link_requests().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["time", "kinetic", "potential"]);
    }

    #[test]
    fn script_console_is_not_serializable() {
        assert!(!Component::ScriptConsole(ScriptConsoleSpec::default()).is_serializable());
        assert!(Component::Button(ButtonSpec::default()).is_serializable());
    }
}
