use crate::audio::constants::VISUALIZER_CAPACITY;
use crate::audio::filter_engine::FilterMode;
use crate::audio::meter_communication::display_utils::metric_lines;
use crate::audio::meter_communication::SessionMonitor;
use crate::ui::WaveformDisplay;
use crate::DcOffsetRemoverParams;
use nih_plug::prelude::{Editor, GuiContext};
use nih_plug_iced::widget::canvas::Canvas;
use nih_plug_iced::widgets as nih_widgets;
use nih_plug_iced::*;
use std::sync::Arc;

pub(crate) fn default_state() -> Arc<IcedState> {
    IcedState::from_size(600, 520)
}

pub(crate) fn create(
    params: Arc<DcOffsetRemoverParams>,
    monitor: SessionMonitor,
    editor_state: Arc<IcedState>,
) -> Option<Box<dyn Editor>> {
    create_iced_editor::<DcOffsetRemoverEditor>(editor_state, (params, monitor))
}

struct DcOffsetRemoverEditor {
    params: Arc<DcOffsetRemoverParams>,
    context: Arc<dyn GuiContext>,
    monitor: SessionMonitor,

    /// Reused for every redraw so reading the waveform never allocates
    waveform: Vec<f32>,

    filter_mode_slider_state: nih_widgets::param_slider::State,
    visualizer_slider_state: nih_widgets::param_slider::State,
}

#[derive(Debug, Clone, Copy)]
enum Message {
    /// Update a parameter's value.
    ParamUpdate(nih_widgets::ParamMessage),
}

impl IcedEditor for DcOffsetRemoverEditor {
    type Executor = executor::Default;
    type Message = Message;
    type InitializationFlags = (Arc<DcOffsetRemoverParams>, SessionMonitor);

    fn new(
        (params, monitor): Self::InitializationFlags,
        context: Arc<dyn GuiContext>,
    ) -> (Self, Command<Self::Message>) {
        let editor = DcOffsetRemoverEditor {
            params,
            context,
            monitor,

            waveform: vec![0.0; VISUALIZER_CAPACITY],

            filter_mode_slider_state: Default::default(),
            visualizer_slider_state: Default::default(),
        };

        (editor, Command::none())
    }

    fn context(&self) -> &dyn GuiContext {
        self.context.as_ref()
    }

    fn update(
        &mut self,
        _window: &mut WindowQueue,
        message: Self::Message,
    ) -> Command<Self::Message> {
        match message {
            Message::ParamUpdate(message) => self.handle_param_message(message),
        }

        Command::none()
    }

    fn view(&mut self) -> Element<'_, Self::Message> {
        let pre = metric_lines(&self.monitor.pre_metrics());
        let post = metric_lines(&self.monitor.post_metrics());

        let mut metrics = Row::new().spacing(30).push(metric_column("Input", pre));
        metrics = metrics.push(metric_column("Output", post));

        let mut layout = Column::new()
            .align_items(Alignment::Center)
            .padding(20)
            .spacing(10)
            .push(
                Text::new("DC Offset Remover")
                    .font(assets::NOTO_SANS_LIGHT)
                    .size(24)
                    .height(30.into())
                    .width(Length::Fill)
                    .horizontal_alignment(alignment::Horizontal::Center)
                    .vertical_alignment(alignment::Vertical::Bottom),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.filter_mode_slider_state,
                    &self.params.filter_mode,
                )
                .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.visualizer_slider_state,
                    &self.params.visualizer,
                )
                .map(Message::ParamUpdate),
            )
            .push(Text::new(active_mode_label(self.monitor.active_filter_mode())).size(14))
            .push(Space::with_height(10.into()))
            .push(metrics);

        layout = layout.push(Space::with_height(10.into()));
        if self.params.visualizer.value() {
            let count = self.monitor.read_visualizer_window(&mut self.waveform);
            layout = layout.push(
                Canvas::new(WaveformDisplay::new(&self.waveform[..count]))
                    .width(Length::Fill)
                    .height(200.into()),
            );
        } else {
            layout = layout.push(
                Text::new("Visualizer Disabled")
                    .size(16)
                    .height(200.into())
                    .width(Length::Fill)
                    .horizontal_alignment(alignment::Horizontal::Center)
                    .vertical_alignment(alignment::Vertical::Center),
            );
        }

        layout.into()
    }

    fn background_color(&self) -> nih_plug_iced::Color {
        nih_plug_iced::Color {
            r: 0.98,
            g: 0.98,
            b: 0.98,
            a: 1.0,
        }
    }
}

fn metric_column<'a>(title: &str, lines: [String; 4]) -> Column<'a, Message> {
    let column = Column::new().spacing(4).push(Text::new(title.to_string()).size(18));
    lines.into_iter().fold(column, |column, line| column.push(Text::new(line).size(14)))
}

fn active_mode_label(mode: FilterMode) -> String {
    let name = match mode {
        FilterMode::Bypass => "Bypass",
        FilterMode::OnePoleDcBlocker => "1st-order DC blocker",
        FilterMode::TwoPoleHighPass10Hz => "2nd-order 10Hz",
        FilterMode::TwoPoleHighPass20Hz => "2nd-order 20Hz",
    };
    format!("Active: {name}")
}
