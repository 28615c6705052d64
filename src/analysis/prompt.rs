/// Instruction sent to the completion service. The model is asked to reason
/// step by step and finish with a single JSON object in the `ToneResult` shape.
pub fn build_tone_prompt(message: &str) -> String {
    format!(
        r#"You analyze the emotional content of short chat messages.

Message: "{message}"

Work through these steps:
1. Decide whether the message is literal or uses sarcasm, irony or hyperbole.
2. Name the primary emotion, using Plutchik's wheel (joy, trust, fear, surprise, sadness, disgust, anger, anticipation) or the GoEmotions taxonomy when it fits better.
3. List any secondary emotions.
4. Describe the overall tone (formal, casual, urgent, playful, serious, ...).
5. Describe the likely intention (inform, persuade, request, complain, praise, ...).
6. Point to the words or patterns that support the analysis.

Finish with exactly one JSON object of this shape:
{{
  "emotion": "primary emotion",
  "confidence": 0.0 to 1.0,
  "explanation": "explanation citing the message",
  "tone": "overall tone",
  "intention": "likely intention",
  "secondaryEmotions": [
    {{"emotion": "secondary emotion", "confidence": 0.0 to 1.0}}
  ]
}}
"#
    )
}
