use midiscan::{
    controller_name, ChannelVoiceEvent, Division, Event, EventKind, MetaEvent, MidiFile,
    SysexEvent, Tempo, TimeConverter, Track,
};

/// Sections printed for each track.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub show_events: bool,
    pub show_notes: bool,
    pub show_bar_beat: bool,
}

pub fn print_report(midi_file: &MidiFile, track_filter: Option<usize>, options: ReportOptions) {
    print_header(midi_file);
    let converter = match midi_file.time_converter() {
        Ok(converter) => Some(converter),
        Err(err) => {
            log::warn!("Musical time not available: {err}");
            None
        }
    };
    // positions and note lengths fall back to raw ticks without a converter
    let bar_beat = if options.show_bar_beat {
        converter.as_ref()
    } else {
        None
    };
    for (index, track) in midi_file.tracks.iter().enumerate() {
        if track_filter.is_some_and(|wanted| wanted != index) {
            continue;
        }
        print_track_summary(index, track);
        if options.show_events {
            for event in &track.events {
                println!(
                    "    {:>10} {}",
                    position(event.absolute_ticks, bar_beat),
                    describe_event(event)
                );
            }
        }
        if options.show_notes {
            print_notes(track, converter.as_ref(), bar_beat);
        }
    }
}

fn print_header(midi_file: &MidiFile) {
    let header = &midi_file.header;
    println!("Format: {:?}", header.format);
    println!("Tracks: {}", header.track_count);
    match header.division {
        Division::TicksPerBeat(ticks) => println!("Division: {ticks} ticks per beat"),
        Division::Smpte {
            frames_per_second,
            ticks_per_frame,
        } => println!(
            "Division: SMPTE {frames_per_second} fps, {ticks_per_frame} ticks per frame"
        ),
    }
    if midi_file
        .tracks
        .iter()
        .all(|track| track.tempo_changes().is_empty())
    {
        println!("Tempo: {:.2} bpm (default)", Tempo::default().bpm);
    }
}

fn print_track_summary(index: usize, track: &Track) {
    println!("--------");
    println!(
        "Track {index}: {} ({} events, {} bytes, {} ticks)",
        track.name().unwrap_or("unnamed"),
        track.events.len(),
        track.byte_length(),
        track.end_ticks()
    );
    for tempo in track.tempo_changes() {
        println!("  tempo {:.2} bpm at {}", tempo.value.bpm, tempo.ticks);
    }
    for signature in track.time_signatures() {
        println!(
            "  time signature {} at {}, metronome {}",
            signature.value,
            signature.ticks,
            signature.value.metronome()
        );
    }
    for signature in track.key_signatures() {
        println!("  key signature {} at {}", signature.value, signature.ticks);
    }
}

fn print_notes(
    track: &Track,
    converter: Option<&TimeConverter>,
    bar_beat: Option<&TimeConverter>,
) {
    let notes = track.notes();
    println!("  {} notes", notes.len());
    for note in notes {
        let length = converter.map_or_else(
            || format!("{} ticks", note.duration_ticks),
            |c| c.note_length(note.duration_ticks).to_string(),
        );
        println!(
            "    {:>10} {:<4} ch:{:<2} velocity:{:<3} {length}",
            position(note.start_ticks, bar_beat),
            note.pitch_name(),
            note.channel,
            note.velocity_on,
        );
    }
}

fn position(ticks: u64, bar_beat: Option<&TimeConverter>) -> String {
    match bar_beat {
        Some(converter) => {
            let (beat, remainder) = converter.bar_beat(ticks);
            format!("{beat}:{remainder}")
        }
        None => ticks.to_string(),
    }
}

fn describe_event(event: &Event) -> String {
    match &event.kind {
        EventKind::Meta(meta) => describe_meta(meta),
        EventKind::Sysex(SysexEvent::Normal(payload)) => format!("sysex {} bytes", payload.len()),
        EventKind::Sysex(sysex @ SysexEvent::Divided(packets)) => format!(
            "sysex {} bytes in {} packets",
            sysex.payload_len(),
            packets.len()
        ),
        EventKind::Sysex(SysexEvent::Authorization(payload)) => {
            format!("sysex escape {} bytes", payload.len())
        }
        EventKind::ChannelVoice(message) => describe_channel_voice(message),
    }
}

fn describe_meta(meta: &MetaEvent) -> String {
    match meta {
        MetaEvent::SequenceNumber(number) => format!("sequence number {number}"),
        MetaEvent::MidiChannelPrefix(channel) => format!("channel prefix {channel}"),
        MetaEvent::EndOfTrack => "end of track".to_string(),
        MetaEvent::SetTempo(tempo) => format!(
            "tempo {} us per quarter ({:.2} bpm)",
            tempo.micros_per_quarter, tempo.bpm
        ),
        MetaEvent::SmpteOffset(offset) => format!(
            "smpte offset {:02}:{:02}:{:02}:{:02}.{:02} at {} fps",
            offset.hours,
            offset.minutes,
            offset.seconds,
            offset.frames,
            offset.subframes,
            offset.frame_rate.as_f64()
        ),
        MetaEvent::TimeSignature(signature) => format!("time signature {signature}"),
        MetaEvent::KeySignature(signature) => format!("key signature {signature}"),
        MetaEvent::SequencerSpecific(data) => format!("sequencer specific {} bytes", data.len()),
        other => match other.text() {
            Some(text) => format!("text {text:?}"),
            None => format!("{other:?}"),
        },
    }
}

fn describe_channel_voice(message: &ChannelVoiceEvent) -> String {
    let channel = message.channel();
    match *message {
        ChannelVoiceEvent::NoteOff { note, velocity, .. } => {
            format!("ch:{channel} note off {note} velocity {velocity}")
        }
        ChannelVoiceEvent::NoteOn { note, velocity, .. } => {
            format!("ch:{channel} note on {note} velocity {velocity}")
        }
        ChannelVoiceEvent::PolyAftertouch { note, pressure, .. } => {
            format!("ch:{channel} aftertouch {note} pressure {pressure}")
        }
        ChannelVoiceEvent::Controller {
            controller, value, ..
        } => format!(
            "ch:{channel} {} = {value}",
            controller_name(controller).unwrap_or("Undefined")
        ),
        ChannelVoiceEvent::ProgramChange { program, .. } => {
            format!("ch:{channel} program {program}")
        }
        ChannelVoiceEvent::ChannelAftertouch { pressure, .. } => {
            format!("ch:{channel} channel pressure {pressure}")
        }
        ChannelVoiceEvent::PitchBend { value, .. } => format!("ch:{channel} pitch bend {value}"),
    }
}
