pub mod audio;
mod editor;
mod ui;

use audio::audio_engine::AudioSessionController;
use audio::filter_engine::FilterMode;
use audio::meter_communication::SessionMonitor;
use nih_plug::prelude::*;
use nih_plug_iced::IcedState;
use std::sync::Arc;

struct DcOffsetRemover {
    params: Arc<DcOffsetRemoverParams>,

    /// Audio-thread state. Built once in `default()` so the editor can attach to the
    /// same shared metrics before `initialize()` runs.
    session: AudioSessionController,
    /// UI-side handle onto `session`
    monitor: SessionMonitor,
}

#[derive(Params)]
struct DcOffsetRemoverParams {
    /// The editor state, saved together with the parameter state so the window size can be
    /// restored.
    #[persist = "editor-state"]
    editor_state: Arc<IcedState>,

    #[id = "filterMode"]
    pub filter_mode: EnumParam<FilterMode>,

    /// Feeds the waveform preview. Only has an effect while the editor is open.
    #[id = "visualizer"]
    pub visualizer: BoolParam,
}

impl Default for DcOffsetRemover {
    fn default() -> Self {
        let session = AudioSessionController::new();
        let monitor = session.monitor();

        Self {
            params: Arc::new(DcOffsetRemoverParams::default()),
            session,
            monitor,
        }
    }
}

impl Default for DcOffsetRemoverParams {
    fn default() -> Self {
        Self {
            editor_state: editor::default_state(),

            filter_mode: EnumParam::new("Filter Mode", FilterMode::default()),
            visualizer: BoolParam::new("Visualizer", false),
        }
    }
}

impl Plugin for DcOffsetRemover {
    const NAME: &'static str = "DC Offset Remover";
    const VENDOR: &'static str = "Cmdv";
    const URL: &'static str = env!("CARGO_PKG_HOMEPAGE");
    const EMAIL: &'static str = "info@cmdv.me";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The first audio IO layout is used as the default
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),

            aux_input_ports: &[],
            aux_output_ports: &[],

            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let (sample_rate, max_block_size, num_channels) =
            session_config(audio_io_layout, buffer_config);

        nih_log!(
            "Initializing: {} Hz, max block {}, {} channel(s)",
            sample_rate,
            max_block_size,
            num_channels
        );

        // The host restores parameters before this point, so start in the stored mode
        self.monitor.set_filter_mode(self.params.filter_mode.value());

        match self.session.prepare(sample_rate, max_block_size, num_channels) {
            Ok(()) => true,
            Err(err) => {
                nih_error!("Failed to prepare the audio session: {err}");
                false
            }
        }
    }

    fn reset(&mut self) {
        self.session.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Nobody is looking at the waveform while the editor is closed
        let visualize = self.params.visualizer.value() && self.params.editor_state.is_open();
        self.monitor.set_filter_mode(self.params.filter_mode.value());
        self.monitor.set_visualizer_enabled(visualize);

        self.session.process(buffer.as_slice());

        ProcessStatus::Tail(self.session.tail_samples())
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        nih_log!("Editor requested");

        editor::create(
            self.params.clone(),
            self.monitor.clone(),
            self.params.editor_state.clone(),
        )
    }
}

/// What the host handed us, unmodified. Unusable values are rejected by `prepare`.
fn session_config(
    audio_io_layout: &AudioIOLayout,
    buffer_config: &BufferConfig,
) -> (f64, usize, usize) {
    let num_channels = audio_io_layout.main_output_channels.map_or(0, NonZeroU32::get);

    (
        buffer_config.sample_rate as f64,
        buffer_config.max_buffer_size as usize,
        num_channels as usize,
    )
}

impl ClapPlugin for DcOffsetRemover {
    const CLAP_ID: &'static str = "me.cmdv.dc-offset-remover";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Removes DC offset and sub-audible rumble with live pre/post diagnostics");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Utility,
    ];
}

impl Vst3Plugin for DcOffsetRemover {
    const VST3_CLASS_ID: [u8; 16] = *b"CmdvDcOffsetRmvr";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Tools];
}

nih_export_clap!(DcOffsetRemover);
nih_export_vst3!(DcOffsetRemover);
